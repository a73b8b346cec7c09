use anyhow::{bail, Result};
use nalgebra::Vector3;

use crate::config::DeviceConfig;
use crate::math::Pose;

/// デバイス実寸キャリブレーション(メートル)
///
/// 原点はリアカメラ。画面は x 負方向・y 負方向に広がる。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub screen_width: f32,
    pub screen_height: f32,
    /// リアカメラと画面右端の距離
    pub camera_offset_x: f32,
    /// リアカメラと画面上端の距離
    pub camera_offset_y: f32,
}

impl DeviceProfile {
    /// 設定テーブルからモデル識別子を引く
    ///
    /// 未知の識別子はエラー。ゼロ寸法のまま続行するとフラスタムが退化するため。
    pub fn lookup(config: &DeviceConfig) -> Result<Self> {
        let Some(profile) = config.profiles.get(&config.model) else {
            bail!("missing device calibration for model '{}'", config.model);
        };
        Ok(Self {
            screen_width: profile.screen_width,
            screen_height: profile.screen_height,
            camera_offset_x: profile.camera_offset_x,
            camera_offset_y: profile.camera_offset_y,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.screen_width / self.screen_height
    }
}

/// 仮想ウィンドウの四隅 + 中心(ワールド座標)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCorners {
    pub ul: Vector3<f32>,
    pub ll: Vector3<f32>,
    pub lr: Vector3<f32>,
    pub ur: Vector3<f32>,
    pub center: Vector3<f32>,
}

/// 画面の四隅と中心のデバイスローカル座標
///
/// コーナーは中心からのオフセットとして保持し、FOVスケールを掛けてから
/// デバイスポーズでワールドへ変換する。
#[derive(Debug, Clone, Copy)]
pub struct DeviceGeometry {
    pub center: Vector3<f32>,
    pub to_ul: Vector3<f32>,
    pub to_ll: Vector3<f32>,
    pub to_lr: Vector3<f32>,
    pub to_ur: Vector3<f32>,
}

impl DeviceGeometry {
    pub fn new(profile: &DeviceProfile) -> Self {
        let w = profile.screen_width;
        let h = profile.screen_height;
        let ox = profile.camera_offset_x;
        let oy = profile.camera_offset_y;

        let center = Vector3::new(-(w / 2.0) + ox, -(h / 2.0) + oy, 0.0);
        let ul = Vector3::new(-w + ox, oy, 0.0);
        let ll = Vector3::new(-w + ox, -h + oy, 0.0);
        let lr = Vector3::new(ox, -h + oy, 0.0);
        let ur = Vector3::new(ox, oy, 0.0);

        Self {
            center,
            to_ul: ul - center,
            to_ll: ll - center,
            to_lr: lr - center,
            to_ur: ur - center,
        }
    }

    /// FOVスケールを適用したコーナーをワールド座標で返す
    pub fn corners_world(&self, device_pose: &Pose, fov_scale: f32) -> WindowCorners {
        WindowCorners {
            ul: device_pose.transform_point(&(self.center + self.to_ul * fov_scale)),
            ll: device_pose.transform_point(&(self.center + self.to_ll * fov_scale)),
            lr: device_pose.transform_point(&(self.center + self.to_lr * fov_scale)),
            ur: device_pose.transform_point(&(self.center + self.to_ur * fov_scale)),
            center: device_pose.transform_point(&self.center),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    #[test]
    fn test_lookup_known_model() {
        let config = DeviceConfig::default();
        let profile = DeviceProfile::lookup(&config).unwrap();
        assert_eq!(profile.screen_width, 0.0645);
        assert_eq!(profile.screen_height, 0.1395);
    }

    #[test]
    fn test_lookup_unknown_model_fails() {
        let mut config = DeviceConfig::default();
        config.model = "UnknownDevice1,1".to_string();
        let err = DeviceProfile::lookup(&config).unwrap_err();
        assert!(err.to_string().contains("missing device calibration"));
    }

    #[test]
    fn test_corner_offsets_symmetric_about_center() {
        let config = DeviceConfig::default();
        let profile = DeviceProfile::lookup(&config).unwrap();
        let geometry = DeviceGeometry::new(&profile);
        // 対角コーナーのオフセットは符号反転
        assert!((geometry.to_ul + geometry.to_lr).norm() < 1e-6);
        assert!((geometry.to_ll + geometry.to_ur).norm() < 1e-6);
        assert_eq!(geometry.to_ul.x, -profile.screen_width / 2.0);
        assert_eq!(geometry.to_ul.y, profile.screen_height / 2.0);
    }

    #[test]
    fn test_fov_scale_widens_corners() {
        let config = DeviceConfig::default();
        let profile = DeviceProfile::lookup(&config).unwrap();
        let geometry = DeviceGeometry::new(&profile);
        let pose = Pose::identity();
        let normal = geometry.corners_world(&pose, 1.0);
        let wide = geometry.corners_world(&pose, 2.0);
        let normal_span = (normal.ur - normal.ul).norm();
        let wide_span = (wide.ur - wide.ul).norm();
        assert!((wide_span - 2.0 * normal_span).abs() < 1e-6);
        // 中心はスケールの影響を受けない
        assert_eq!(normal.center, wide.center);
    }
}

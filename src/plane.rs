use nalgebra::{UnitQuaternion, Vector3};

use crate::config::PlaneConfig;
use crate::device::{DeviceProfile, WindowCorners};
use crate::math::Pose;

/// パススルー平面のリグ
///
/// デバイスカメラを親とする: 親回転 → ローカルz移動 → コーナースライド。
/// コーナー半幅は画面アスペクト比 * plane_scale / 2、半高は設定値。
/// ローカル座標は x 右, y 上, z 奥(平面ローカル単位、メートルではない)。
#[derive(Debug, Clone, Copy)]
pub struct PassthroughPlane {
    parent_rotation: UnitQuaternion<f32>,
    z_offset: f32,
    points_offset: Vector3<f32>,
    half_width: f32,
    half_height: f32,
}

impl PassthroughPlane {
    pub fn new(profile: &DeviceProfile, config: &PlaneConfig) -> Self {
        Self {
            parent_rotation: UnitQuaternion::identity(),
            z_offset: config.exp_c,
            points_offset: Vector3::zeros(),
            half_width: profile.aspect() * config.plane_scale / 2.0,
            half_height: config.half_height,
        }
    }

    pub fn z_offset(&self) -> f32 {
        self.z_offset
    }

    pub fn set_z_offset(&mut self, z: f32) {
        self.z_offset = z;
    }

    pub fn parent_rotation(&self) -> UnitQuaternion<f32> {
        self.parent_rotation
    }

    pub fn set_parent_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.parent_rotation = rotation;
    }

    /// Rotationモードのコーナースライド
    pub fn points_offset(&self) -> Vector3<f32> {
        self.points_offset
    }

    pub fn set_points_offset(&mut self, offset: Vector3<f32>) {
        self.points_offset = offset;
    }

    fn local_to_world(&self, device_pose: &Pose, local: &Vector3<f32>) -> Vector3<f32> {
        let in_parent = self
            .parent_rotation
            .transform_vector(&(Vector3::new(0.0, 0.0, self.z_offset) + self.points_offset + local));
        device_pose.transform_point(&in_parent)
    }

    /// スライド込みの平面中心(ワールド座標)
    pub fn center_world(&self, device_pose: &Pose) -> Vector3<f32> {
        self.local_to_world(device_pose, &Vector3::zeros())
    }

    /// 四隅 + 中心(ワールド座標)
    pub fn corners_world(&self, device_pose: &Pose) -> WindowCorners {
        let hw = self.half_width;
        let hh = self.half_height;
        WindowCorners {
            ul: self.local_to_world(device_pose, &Vector3::new(-hw, hh, 0.0)),
            ll: self.local_to_world(device_pose, &Vector3::new(-hw, -hh, 0.0)),
            lr: self.local_to_world(device_pose, &Vector3::new(hw, -hh, 0.0)),
            ur: self.local_to_world(device_pose, &Vector3::new(hw, hh, 0.0)),
            center: self.center_world(device_pose),
        }
    }
}

/// 焦点距離と視点角度からパススルー平面を配置する
#[derive(Debug, Clone)]
pub struct PlanePlacer {
    config: PlaneConfig,
}

impl PlanePlacer {
    pub fn new(config: PlaneConfig) -> Self {
        Self { config }
    }

    /// 焦点距離 → 平面ローカルz距離の指数フィット
    ///
    /// 近いシーンほど平面を奥へ押し出す(focusについて単調減少)。
    pub fn z_offset(&self, focus: f32) -> f32 {
        self.config.exp_a * (-self.config.exp_b * focus).exp() + self.config.exp_c
    }

    /// z距離と補正回転を平面に適用する
    ///
    /// 観測者位置をデバイスカメラ相対で表し、画面法線との角度を平面の
    /// 半FOV範囲へ射影して打ち消し回転を求める。垂直項は符号反転して適用。
    pub fn update(
        &self,
        plane: &mut PassthroughPlane,
        focus: f32,
        observer_world: &Vector3<f32>,
        device_pose: &Pose,
    ) {
        let d = self.z_offset(focus);
        plane.set_z_offset(d);

        let eyes_rel = device_pose.inverse_transform_point(observer_world);
        if eyes_rel.z.abs() <= f32::EPSILON {
            return;
        }
        let alpha = (-eyes_rel.x / eyes_rel.z).atan();
        let beta = (-eyes_rel.y / eyes_rel.z).atan();

        let px = d * alpha.tan();
        let py = d * beta.tan();
        let wx = d * self.config.half_fov_h.tan();
        let wy = d * self.config.half_fov_v.tan();

        let x = -self.config.half_width * (px / wx);
        let y = -self.config.half_height * (py / wy);

        let ax = (x / d).atan();
        let ay = (y / d).atan();

        let rotation_horizontal = -alpha - ax;
        let rotation_vertical = -beta - ay;

        plane.set_parent_rotation(UnitQuaternion::from_euler_angles(
            -rotation_vertical,
            rotation_horizontal,
            0.0,
        ));
    }
}

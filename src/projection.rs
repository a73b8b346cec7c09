use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::camera::{ViewCamera, Viewport};
use crate::config::{RenderConfig, RenderMethod};
use crate::device::{DeviceGeometry, DeviceProfile, WindowCorners};
use crate::frustum::{asymmetric_projection, frustum_bounds};
use crate::math::Pose;
use crate::plane::PassthroughPlane;
use crate::scene::{GeometryLayer, SceneQuery};

/// 射影の全状態
///
/// フラスタムロックのロールバック単位。3フィールドは常に一括で更新/復元され、
/// 部分的な巻き戻しは起きない。
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionState {
    pub observer_position: Vector3<f32>,
    pub projection: Matrix4<f32>,
    pub window_offset: Vector3<f32>,
}

impl ProjectionState {
    fn initial() -> Self {
        Self {
            observer_position: Vector3::zeros(),
            projection: Matrix4::identity(),
            window_offset: Vector3::zeros(),
        }
    }
}

/// 追跡視点から観測者ポーズと非対称射影行列を作る
///
/// 毎フレーム update の先頭で状態のスナップショットを取り、ロック有効時に
/// 四隅レイがパススルーウィンドウを外れたらスナップショットへ単一代入で戻す。
pub struct ProjectionEngine {
    pub config: RenderConfig,
    geometry: DeviceGeometry,
    state: ProjectionState,
    observer_rotation: UnitQuaternion<f32>,
}

impl ProjectionEngine {
    pub fn new(profile: &DeviceProfile, config: RenderConfig) -> Self {
        Self {
            config,
            geometry: DeviceGeometry::new(profile),
            state: ProjectionState::initial(),
            observer_rotation: UnitQuaternion::identity(),
        }
    }

    pub fn state(&self) -> &ProjectionState {
        &self.state
    }

    /// 観測者ポーズ(位置は計算値、向きはデバイスと同じ)
    pub fn observer_pose(&self) -> Pose {
        Pose::new(self.state.observer_position, self.observer_rotation)
    }

    pub fn view_camera(&self) -> ViewCamera {
        ViewCamera::new(self.observer_pose(), self.state.projection)
    }

    /// 1フレーム分の更新
    ///
    /// tracked_local は ViewpointTracker の出すデバイスローカル視点。
    pub fn update(
        &mut self,
        tracked_local: &Vector3<f32>,
        device_pose: &Pose,
        plane: &mut PassthroughPlane,
        viewport: &Viewport,
        scene: &dyn SceneQuery,
    ) {
        let snapshot = self.state.clone();
        self.observer_rotation = device_pose.rotation;

        match self.config.method {
            RenderMethod::Rotation => self.update_rotation(tracked_local, device_pose, plane),
            RenderMethod::Upr
            | RenderMethod::Dpr
            | RenderMethod::BiggerFov
            | RenderMethod::UprDprInterpolation => {
                self.update_off_axis(tracked_local, device_pose, plane)
            }
        }

        if self.config.lock_to_window && !self.corners_hit_window(viewport, scene) {
            self.state = snapshot;
            plane.set_points_offset(self.state.window_offset);
        }
    }

    /// UPR/DPR/BiggerFOV/補間の共通経路
    ///
    /// 補間係数αで、コーナーと観測者を実ウィンドウ(パススルー平面)側へ寄せる。
    /// α=0 で正確な視点追従フラスタム、α=1 で固定ウィンドウ。
    fn update_off_axis(
        &mut self,
        tracked_local: &Vector3<f32>,
        device_pose: &Pose,
        plane: &PassthroughPlane,
    ) {
        let alpha = self.config.interpolation;
        let cam_pos = device_pose.position;

        let observer_position =
            cam_pos + (1.0 - alpha) * (device_pose.transform_point(tracked_local) - cam_pos);

        let raw = self.geometry.corners_world(device_pose, self.config.fov_scale);
        let target = plane.corners_world(device_pose);
        let corners = WindowCorners {
            ul: raw.ul + alpha * (target.ul - raw.ul),
            ll: raw.ll + alpha * (target.ll - raw.ll),
            lr: raw.lr + alpha * (target.lr - raw.lr),
            ur: raw.ur + alpha * (target.ur - raw.ur),
            center: raw.center + alpha * (target.center - raw.center),
        };

        let observer_pose = Pose::new(observer_position, device_pose.rotation);
        // d: 補間後のウィンドウ中心平面まで / n: 実画面まで
        let d = observer_pose.inverse_transform_point(&corners.center).z;
        let n = observer_pose.inverse_transform_point(&raw.center).z;
        let f = self.config.far_clip;

        let bounds = frustum_bounds(&observer_pose, &corners, n, d);
        self.state = ProjectionState {
            observer_position,
            projection: asymmetric_projection(&bounds, n, f),
            window_offset: self.state.window_offset,
        };
    }

    /// Rotation方式
    ///
    /// 視点とカメラ前方軸の水平/垂直角をバイアス付きarctanで求め、
    /// 平面のコーナー集合を角度×スライド係数だけずらす。観測者はデバイス
    /// カメラに固定、ニアプレーンも固定値。ロック有効時は垂直スライドのみ
    /// 0に強制される(水平は残る)。
    fn update_rotation(
        &mut self,
        tracked_local: &Vector3<f32>,
        device_pose: &Pose,
        plane: &mut PassthroughPlane,
    ) {
        let alpha = ((tracked_local.x + self.config.rotation_bias_x) / -tracked_local.z).atan();
        let beta = ((tracked_local.y + self.config.rotation_bias_y) / -tracked_local.z).atan();

        let slide_horizontal = alpha * self.config.slide_factor;
        let mut slide_vertical = beta * self.config.slide_factor;
        if self.config.lock_to_window {
            slide_vertical = 0.0;
        }
        let window_offset = Vector3::new(-slide_horizontal, slide_vertical, 0.0);
        plane.set_points_offset(window_offset);

        let observer_position = device_pose.position;
        let observer_pose = Pose::new(observer_position, device_pose.rotation);

        let corners = plane.corners_world(device_pose);
        let d = observer_pose.inverse_transform_point(&corners.center).z;
        let n = self.config.rotation_near;
        let f = self.config.far_clip;

        let bounds = frustum_bounds(&observer_pose, &corners, n, d);
        self.state = ProjectionState {
            observer_position,
            projection: asymmetric_projection(&bounds, n, f),
            window_offset,
        };
    }

    /// 四隅ピクセルのレイが全てパススルーウィンドウ面に当たるか
    fn corners_hit_window(&self, viewport: &Viewport, scene: &dyn SceneQuery) -> bool {
        let camera = self.view_camera();
        for pixel in viewport.corners() {
            let Some(ray) = camera.viewport_ray(viewport, &pixel) else {
                return false;
            };
            if scene
                .raycast(
                    &ray,
                    self.config.lock_ray_max_distance,
                    GeometryLayer::PassthroughWindow,
                )
                .is_none()
            {
                return false;
            }
        }
        true
    }
}

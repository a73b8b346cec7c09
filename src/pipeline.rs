use anyhow::Result;
use log::debug;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::camera::Viewport;
use crate::config::{Config, RenderConfig};
use crate::depth::{DepthEstimator, FocusEstimate};
use crate::device::DeviceProfile;
use crate::math::Pose;
use crate::plane::{PassthroughPlane, PlanePlacer};
use crate::projection::ProjectionEngine;
use crate::scene::SceneQuery;
use crate::tracker::{FaceSample, FaceSlot, TrackedViewpoint, ViewpointTracker};

/// 1ティックの出力(外部レンダラが消費する)
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// 観測者ポーズ(仮想カメラ)
    pub observer: Pose,
    /// 非対称射影行列
    pub projection: Matrix4<f32>,
    /// 焦点距離の内訳
    pub focus: FocusEstimate,
    /// パススルー平面のローカルz
    pub plane_z_offset: f32,
    /// パススルー平面の親フレーム回転
    pub plane_rotation: UnitQuaternion<f32>,
    /// このフレームの追跡視点(顔が無ければ前回値)
    pub viewpoint: Option<TrackedViewpoint>,
}

/// フレームごとの更新パイプライン
///
/// 固定順で各コンポーネントを1回ずつ回す:
/// ViewpointTracker → ProjectionEngine → DepthEstimator → PlanePlacer。
/// シングルスレッド前提。顔トラッキングの非同期コールバックは
/// on_face_changed 経由でスロットに書くだけで、消費は次のティック。
/// 顔が無いフレームは追跡と射影をスキップし、前回の導出状態を保持する。
pub struct Pipeline {
    face_slot: FaceSlot,
    tracker: ViewpointTracker,
    engine: ProjectionEngine,
    estimator: DepthEstimator,
    placer: PlanePlacer,
    plane: PassthroughPlane,
    viewport: Viewport,
}

impl Pipeline {
    /// 設定からパイプラインを組む。未知のデバイス識別子はここでエラーになる。
    pub fn new(config: &Config, viewport: Viewport) -> Result<Self> {
        let profile = DeviceProfile::lookup(&config.device)?;
        let placer = PlanePlacer::new(config.plane.clone());
        let mut plane = PassthroughPlane::new(&profile, &config.plane);
        plane.set_z_offset(placer.z_offset(config.depth.default_focus));

        Ok(Self {
            face_slot: FaceSlot::new(),
            tracker: ViewpointTracker::from_config(&config.tracker),
            engine: ProjectionEngine::new(&profile, config.render.clone()),
            estimator: DepthEstimator::new(config.depth.clone()),
            placer,
            plane,
            viewport,
        })
    }

    /// 顔トラッキングコールバックから呼ぶ
    pub fn on_face_changed(&mut self, sample: FaceSample) {
        self.face_slot.store(sample);
    }

    /// トラッキングロスト
    pub fn on_face_lost(&mut self) {
        self.face_slot.clear();
    }

    /// UIからのレンダリング方式/パラメータ変更用
    pub fn render_config_mut(&mut self) -> &mut RenderConfig {
        &mut self.engine.config
    }

    pub fn plane(&self) -> &PassthroughPlane {
        &self.plane
    }

    pub fn viewpoint(&self) -> Option<&TrackedViewpoint> {
        self.tracker.last()
    }

    /// 1レンダーフレーム分の更新
    pub fn tick(
        &mut self,
        device_pose: &Pose,
        anchored: &[Vector3<f32>],
        scene: &dyn SceneQuery,
    ) -> FrameOutput {
        if let Some(sample) = self.face_slot.current() {
            let viewpoint = self.tracker.update(&sample, device_pose);
            debug!(
                "eyes device-space: x: {:.3}, y: {:.3}, z: {:.3}",
                viewpoint.device_local.x, viewpoint.device_local.y, viewpoint.device_local.z
            );
            debug!(
                "eyes world-space: x: {:.3}, y: {:.3}, z: {:.3}",
                viewpoint.world.x, viewpoint.world.y, viewpoint.world.z
            );
            self.engine.update(
                &viewpoint.device_local,
                device_pose,
                &mut self.plane,
                &self.viewport,
                scene,
            );
        }

        let camera = self.engine.view_camera();
        let focus = self.estimator.estimate(
            &camera,
            &self.viewport,
            &device_pose.position,
            anchored,
            scene,
        );
        debug!(
            "estimated background distance: {:.3}, focus distance: {:.3}",
            focus.background, focus.focus
        );

        self.placer
            .update(&mut self.plane, focus.focus, &camera.pose.position, device_pose);
        debug!("image plane z-distance: {:.3}", self.plane.z_offset());

        FrameOutput {
            observer: self.engine.observer_pose(),
            projection: self.engine.state().projection,
            focus,
            plane_z_offset: self.plane.z_offset(),
            plane_rotation: self.plane.parent_rotation(),
            viewpoint: self.tracker.last().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GeometryLayer, Ray};

    /// 深度メッシュ: z = depth の壁 / パススルーウィンドウ: 常にヒット
    struct TestScene {
        depth: f32,
    }

    impl SceneQuery for TestScene {
        fn raycast(&self, ray: &Ray, max: f32, layer: GeometryLayer) -> Option<Vector3<f32>> {
            match layer {
                GeometryLayer::PassthroughWindow => Some(ray.point_at(1.0)),
                GeometryLayer::DepthMesh => {
                    if ray.direction.z.abs() <= f32::EPSILON {
                        return None;
                    }
                    let t = (self.depth - ray.origin.z) / ray.direction.z;
                    if t <= 0.0 || t > max {
                        return None;
                    }
                    Some(ray.point_at(t))
                }
            }
        }
    }

    fn face_sample() -> FaceSample {
        FaceSample {
            left_eye: Vector3::new(-0.03, 0.0, -0.4),
            right_eye: Vector3::new(0.03, 0.0, -0.4),
            left_openness: 1.0,
            right_openness: 1.0,
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(&Config::default(), Viewport::new(1170.0, 2532.0)).unwrap()
    }

    #[test]
    fn test_unknown_device_fails_at_construction() {
        let mut config = Config::default();
        config.device.model = "Nokia3310".to_string();
        assert!(Pipeline::new(&config, Viewport::new(100.0, 100.0)).is_err());
    }

    #[test]
    fn test_tick_without_face_skips_projection() {
        let mut p = pipeline();
        let out = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        assert!(out.viewpoint.is_none());
        // 射影は初期状態のまま
        assert_eq!(out.projection, Matrix4::identity());
        // 深度と平面配置は顔が無くても毎フレーム動く
        assert!(out.focus.focus > 0.0);
        assert!(out.plane_z_offset > 0.0);
    }

    #[test]
    fn test_tick_with_face_updates_projection() {
        let mut p = pipeline();
        p.on_face_changed(face_sample());
        let out = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        assert!(out.viewpoint.is_some());
        assert_ne!(out.projection, Matrix4::identity());
        assert_eq!(out.projection[(3, 2)], -1.0);
    }

    #[test]
    fn test_face_loss_holds_previous_state() {
        let mut p = pipeline();
        p.on_face_changed(face_sample());
        let tracked = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });

        p.on_face_lost();
        let held = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        assert_eq!(held.projection, tracked.projection);
        assert_eq!(held.observer.position, tracked.observer.position);
        // 前回の視点も参照できる
        assert_eq!(held.viewpoint, tracked.viewpoint);
    }

    #[test]
    fn test_focus_follows_scene_depth() {
        let mut p = pipeline();
        p.on_face_changed(face_sample());
        // 数フレーム回して背景距離に収束させる
        let mut out = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        for _ in 0..3 {
            out = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        }
        assert!(out.focus.focus >= 3.0 && out.focus.focus < 4.0, "focus = {}", out.focus.focus);
    }

    #[test]
    fn test_slot_latest_face_wins() {
        let mut p = pipeline();
        let mut near = face_sample();
        near.left_eye.z = -0.2;
        near.right_eye.z = -0.2;
        p.on_face_changed(face_sample());
        p.on_face_changed(near);
        let out = p.tick(&Pose::identity(), &[], &TestScene { depth: 3.0 });
        let vp = out.viewpoint.unwrap();
        assert!((vp.device_local.z + 0.2).abs() < 1e-5);
    }
}

use nalgebra::Vector3;

use crate::config::TrackerConfig;
use crate::math::Pose;

use super::eyes::{detect_closed_eye, select_target_point, ClosedEye};
use super::face::FaceSample;
use super::window::SlidingWindow;

/// 平滑化済みの追跡視点
///
/// device_local が射影エンジンへの入力。world は表示/テレメトリ用に
/// 同じ値をワールド座標へ戻したもの。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedViewpoint {
    pub device_local: Vector3<f32>,
    pub world: Vector3<f32>,
    pub closed_eye: ClosedEye,
}

impl TrackedViewpoint {
    /// ワールド座標の点までの距離(選択オブジェクトの距離表示用)
    pub fn distance_to(&self, point: &Vector3<f32>) -> f32 {
        (point - self.world).norm()
    }
}

/// 生の目ランドマークからデバイスローカルの追跡視点を作る
///
/// 閉眼判定 → 対象点選択 → デバイスローカル変換 → スライディングウィンドウ平均。
/// 顔が無いフレームでは update を呼ばず、last() の値を使い続ける。
#[derive(Debug)]
pub struct ViewpointTracker {
    window: SlidingWindow,
    eye_closed_ratio: f32,
    last: Option<TrackedViewpoint>,
}

impl ViewpointTracker {
    pub fn new(eye_closed_ratio: f32, window_size: usize) -> Self {
        Self {
            window: SlidingWindow::new(window_size),
            eye_closed_ratio,
            last: None,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.eye_closed_ratio, config.window_size)
    }

    pub fn update(&mut self, sample: &FaceSample, device_pose: &Pose) -> TrackedViewpoint {
        let closed = detect_closed_eye(
            sample.left_openness,
            sample.right_openness,
            self.eye_closed_ratio,
        );
        let target = select_target_point(sample, closed);

        let local = device_pose.inverse_transform_point(&target);
        let smoothed = self.window.push(local);

        let viewpoint = TrackedViewpoint {
            device_local: smoothed,
            world: device_pose.transform_point(&smoothed),
            closed_eye: closed,
        };
        self.last = Some(viewpoint);
        viewpoint
    }

    /// 最後に算出した視点(顔が無いフレームのフォールバック)
    pub fn last(&self) -> Option<&TrackedViewpoint> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.window.reset();
        self.last = None;
    }
}

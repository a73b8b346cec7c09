use nalgebra::{Vector2, Vector3};

use crate::camera::{ViewCamera, Viewport};
use crate::config::DepthConfig;
use crate::scene::{GeometryLayer, SceneQuery};

/// フレームごとの焦点距離推定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusEstimate {
    /// 採用した焦点距離(メートル、非負)
    pub focus: f32,
    /// 背景推定値(このフレームで得られなかった場合は前回焦点値)
    pub background: f32,
    /// 採用したアンカーオブジェクトまでの距離
    pub object_distance: Option<f32>,
}

/// 深度キューを1つの焦点距離へ融合する
///
/// 背景(深度メッシュへの9点レイ)とアンカーオブジェクトの画面中心距離で
/// 重み付けする。どのキューも無いフレームでは前回値を使い続ける。
/// 前回値は &mut self の通常状態で、呼び出しはティックごとに1回のみ。
#[derive(Debug)]
pub struct DepthEstimator {
    config: DepthConfig,
    focus: f32,
}

impl DepthEstimator {
    pub fn new(config: DepthConfig) -> Self {
        let focus = config.default_focus;
        Self { config, focus }
    }

    /// 現在の(持ち越し)焦点距離
    pub fn focus(&self) -> f32 {
        self.focus
    }

    /// 1フレーム分の推定
    ///
    /// camera は射影エンジンの出した観測者カメラ。距離はデバイスカメラ位置
    /// から測る。結果は次フレームのフォールバック値として保存される。
    pub fn estimate(
        &mut self,
        camera: &ViewCamera,
        viewport: &Viewport,
        device_position: &Vector3<f32>,
        anchored: &[Vector3<f32>],
        scene: &dyn SceneQuery,
    ) -> FocusEstimate {
        let background = self
            .background_estimate(camera, viewport, device_position, scene)
            .unwrap_or(self.focus);

        // 画面中心に最も近いアンカーオブジェクトを探す
        let mut min_center_distance = f32::INFINITY;
        let mut closest: Option<Vector3<f32>> = None;
        for position in anchored {
            let Some(screen) = camera.world_to_viewport(viewport, position) else {
                continue;
            };
            let center_distance = (viewport.center() - screen).norm();
            if center_distance < min_center_distance {
                min_center_distance = center_distance;
                closest = Some(*position);
            }
        }

        let estimate = match closest {
            // 中心に近いほど背景の重みを下げる
            Some(position) if min_center_distance <= self.config.center_threshold => {
                let background_factor = min_center_distance / self.config.center_threshold;
                let object_distance = (position - device_position).norm();
                FocusEstimate {
                    focus: background_factor * background
                        + (1.0 - background_factor) * object_distance,
                    background,
                    object_distance: Some(object_distance),
                }
            }
            // 画面内に使えるオブジェクトが無い
            _ => FocusEstimate {
                focus: background,
                background,
                object_distance: None,
            },
        };

        self.focus = estimate.focus;
        estimate
    }

    /// 9点レイによる背景距離推定
    ///
    /// ビューポートの 1/3, 1/2, 2/3 位置の格子からレイを飛ばし、深度メッシュ
    /// へのヒット距離を平均する。距離合計がしきい値以下(ヒットが少ない/
    /// 近すぎる)なら None。
    fn background_estimate(
        &self,
        camera: &ViewCamera,
        viewport: &Viewport,
        device_position: &Vector3<f32>,
        scene: &dyn SceneQuery,
    ) -> Option<f32> {
        let fractions = [1.0 / 3.0, 0.5, 2.0 / 3.0];

        let mut sum_of_distances = 0.0_f32;
        let mut hits = 0_u32;
        for fy in fractions {
            for fx in fractions {
                let pixel = Vector2::new(fx * viewport.width, fy * viewport.height);
                let Some(ray) = camera.viewport_ray(viewport, &pixel) else {
                    continue;
                };
                if let Some(hit) =
                    scene.raycast(&ray, self.config.ray_max_distance, GeometryLayer::DepthMesh)
                {
                    sum_of_distances += (hit - device_position).norm();
                    hits += 1;
                }
            }
        }

        if sum_of_distances <= self.config.min_distance_sum {
            return None;
        }
        Some(sum_of_distances / hits as f32)
    }
}

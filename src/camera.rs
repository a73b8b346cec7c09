use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

use crate::math::Pose;
use crate::scene::Ray;

/// ビューポート寸法(ピクセル)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vector2<f32> {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    /// ロック判定に使う四隅のピクセル座標
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        [
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, self.height),
            Vector2::new(self.width, 0.0),
            Vector2::new(self.width, self.height),
        ]
    }
}

/// 観測者(目の位置)に置かれた仮想カメラ
///
/// ポーズはデバイスローカル系と同じ向き(前方 +z)。射影行列はGL規約
/// (カメラ空間 -z 前方)なので、変換時に z を反転する。
#[derive(Debug, Clone, Copy)]
pub struct ViewCamera {
    pub pose: Pose,
    pub projection: Matrix4<f32>,
}

impl ViewCamera {
    pub fn new(pose: Pose, projection: Matrix4<f32>) -> Self {
        Self { pose, projection }
    }

    /// ワールド座標の点をビューポートのピクセル座標へ射影
    ///
    /// カメラの後方にある点は None。
    pub fn world_to_viewport(&self, viewport: &Viewport, point: &Vector3<f32>) -> Option<Vector2<f32>> {
        let local = self.pose.inverse_transform_point(point);
        let eye = Vector4::new(local.x, local.y, -local.z, 1.0);
        let clip = self.projection * eye;
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(Vector2::new(
            (ndc_x * 0.5 + 0.5) * viewport.width,
            (ndc_y * 0.5 + 0.5) * viewport.height,
        ))
    }

    /// ピクセル座標からワールドへのレイ
    ///
    /// ニアプレーン上の点を逆射影して観測者位置から方向を取る。
    /// 射影行列が退化している場合は None。
    pub fn viewport_ray(&self, viewport: &Viewport, point: &Vector2<f32>) -> Option<Ray> {
        let inv = self.projection.try_inverse()?;
        let ndc = Vector4::new(
            point.x / viewport.width * 2.0 - 1.0,
            point.y / viewport.height * 2.0 - 1.0,
            -1.0,
            1.0,
        );
        let eye = inv * ndc;
        if eye.w.abs() <= f32::EPSILON {
            return None;
        }
        let eye = eye / eye.w;
        let local = Vector3::new(eye.x, eye.y, -eye.z);
        let world = self.pose.transform_point(&local);
        let to_point = world - self.pose.position;
        let norm = to_point.norm();
        if norm <= f32::EPSILON {
            return None;
        }
        Some(Ray::new(self.pose.position, to_point / norm))
    }
}

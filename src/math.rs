use nalgebra::{UnitQuaternion, Vector3};

/// 剛体変換(位置 + 回転)
///
/// デバイスポーズと観測者ポーズの共通表現。
/// transform_point はローカル→ワールド、inverse_transform_point はワールド→ローカル。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// 原点、回転なし
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// ローカル座標の点をワールド座標へ
    pub fn transform_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.transform_vector(p) + self.position
    }

    /// ワールド座標の点をローカル座標へ
    pub fn inverse_transform_point(&self, p: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.inverse_transform_vector(&(p - self.position))
    }

    /// 方向ベクトルをワールド座標へ(平行移動なし)
    pub fn transform_vector(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.transform_vector(v)
    }

    /// 方向ベクトルをローカル座標へ(平行移動なし)
    pub fn inverse_transform_vector(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.inverse_transform_vector(v)
    }
}

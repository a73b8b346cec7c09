use nalgebra::Vector3;

/// レイ判定の対象レイヤ
///
/// 外部のシーンは2種類のジオメトリを別レイヤで持つ:
/// 深度メッシュ/平面(背景距離推定用)とパススルーウィンドウ面(フラスタムロック用)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryLayer {
    DepthMesh,
    PassthroughWindow,
}

/// ワールド座標のレイ(direction は正規化済み)
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// 外部の空間インデックスへの同期クエリ
///
/// 戻り値はヒット点のワールド座標。max_distance を超えるヒットは None。
pub trait SceneQuery {
    fn raycast(&self, ray: &Ray, max_distance: f32, layer: GeometryLayer) -> Option<Vector3<f32>>;
}

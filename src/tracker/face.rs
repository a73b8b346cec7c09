use nalgebra::Vector3;

/// 顔トラッキング1サンプル
///
/// 両目のワールド座標と開眼度 (0 = 閉眼, 1 = 開眼)。
/// 外部の顔トラッキングサブシステムが顔の変化を検出するたびに発行する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSample {
    pub left_eye: Vector3<f32>,
    pub right_eye: Vector3<f32>,
    pub left_openness: f32,
    pub right_openness: f32,
}

impl FaceSample {
    /// 両目の中点
    pub fn midpoint(&self) -> Vector3<f32> {
        self.left_eye + 0.5 * (self.right_eye - self.left_eye)
    }
}

/// 非同期コールバック → 同期ティックの単一スロット受け渡し
///
/// 最新の顔だけが意味を持つのでキューではなくスロット。コールバックが
/// 上書きし、ティック側が毎フレーム読む。顔が無い間は None のままで、
/// 消費側は前フレームの導出状態を保持する。
#[derive(Debug, Default)]
pub struct FaceSlot {
    current: Option<FaceSample>,
}

impl FaceSlot {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// コールバックから呼ぶ。既存サンプルを上書きする。
    pub fn store(&mut self, sample: FaceSample) {
        self.current = Some(sample);
    }

    /// トラッキングロストで呼ぶ
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// ティック側の読み出し。スロットは消費されない。
    pub fn current(&self) -> Option<FaceSample> {
        self.current
    }
}

use nalgebra::Vector3;

use super::face::FaceSample;

/// 閉じている目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedEye {
    Neither,
    Left,
    Right,
}

/// 開眼度の比から閉眼を判定する
///
/// 片方がもう片方の ratio 倍より大きく開いているとき(strict比較)、
/// 小さい方を閉眼とみなす。同時にはどちらか一方しか閉眼にならない。
pub fn detect_closed_eye(left_openness: f32, right_openness: f32, ratio: f32) -> ClosedEye {
    if right_openness > left_openness * ratio {
        ClosedEye::Left
    } else if left_openness > right_openness * ratio {
        ClosedEye::Right
    } else {
        ClosedEye::Neither
    }
}

/// 仮想カメラを置く点を選ぶ: 両目開きなら中点、片目閉じなら開いている方
pub fn select_target_point(sample: &FaceSample, closed: ClosedEye) -> Vector3<f32> {
    match closed {
        ClosedEye::Left => sample.right_eye,
        ClosedEye::Right => sample.left_eye,
        ClosedEye::Neither => sample.midpoint(),
    }
}

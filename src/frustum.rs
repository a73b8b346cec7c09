use nalgebra::Matrix4;

use crate::device::WindowCorners;
use crate::math::Pose;

/// 軸外し射影のニアプレーン上のフラスタム範囲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// ウィンドウコーナーを観測者ローカル軸へ射影し、ニアプレーン上へスケールする
///
/// `d` は観測者からウィンドウ中心平面までの垂直距離、`n` はニアプレーン距離。
pub fn frustum_bounds(observer: &Pose, corners: &WindowCorners, n: f32, d: f32) -> FrustumBounds {
    let scale = n / d;
    let to_ul = observer.inverse_transform_vector(&(corners.ul - observer.position));
    let to_ur = observer.inverse_transform_vector(&(corners.ur - observer.position));
    let to_ll = observer.inverse_transform_vector(&(corners.ll - observer.position));

    FrustumBounds {
        left: to_ul.x * scale,
        right: to_ur.x * scale,
        top: to_ul.y * scale,
        bottom: to_ll.y * scale,
    }
}

/// 非対称(軸外し)透視投影行列を組み立てる
///
/// 中心ずれはせん断項が担う標準形。l = -r かつ b = -t のとき対称フラスタムに帰着する。
/// 参考: http://www.songho.ca/opengl/gl_projectionmatrix.html
pub fn asymmetric_projection(bounds: &FrustumBounds, n: f32, f: f32) -> Matrix4<f32> {
    let l = bounds.left;
    let r = bounds.right;
    let t = bounds.top;
    let b = bounds.bottom;

    let mut pm = Matrix4::zeros();
    pm[(0, 0)] = 2.0 * n / (r - l);
    pm[(0, 2)] = (r + l) / (r - l);
    pm[(1, 1)] = 2.0 * n / (t - b);
    pm[(1, 2)] = (t + b) / (t - b);
    pm[(2, 2)] = (f + n) / (n - f);
    pm[(2, 3)] = 2.0 * f * n / (n - f);
    pm[(3, 2)] = -1.0;
    pm
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn symmetric_corners(half_w: f32, half_h: f32, z: f32) -> WindowCorners {
        WindowCorners {
            ul: Vector3::new(-half_w, half_h, z),
            ll: Vector3::new(-half_w, -half_h, z),
            lr: Vector3::new(half_w, -half_h, z),
            ur: Vector3::new(half_w, half_h, z),
            center: Vector3::new(0.0, 0.0, z),
        }
    }

    #[test]
    fn test_symmetric_observer_zero_shear() {
        // 観測者がウィンドウ法線上にいれば l = -r, t = -b でせん断項は消える
        let observer = Pose::new(Vector3::new(0.0, 0.0, -0.5), nalgebra::UnitQuaternion::identity());
        let corners = symmetric_corners(0.03, 0.07, 0.0);
        let n = 0.5;
        let d = 0.5;
        let bounds = frustum_bounds(&observer, &corners, n, d);
        assert!(approx_eq_f32(bounds.left, -bounds.right, 1e-6));
        assert!(approx_eq_f32(bounds.top, -bounds.bottom, 1e-6));

        let pm = asymmetric_projection(&bounds, n, 1000.0);
        assert!(approx_eq_f32(pm[(0, 2)], 0.0, 1e-6));
        assert!(approx_eq_f32(pm[(1, 2)], 0.0, 1e-6));
        assert_eq!(pm[(3, 2)], -1.0);
    }

    #[test]
    fn test_off_center_observer_nonzero_shear() {
        let observer = Pose::new(Vector3::new(0.01, 0.0, -0.5), nalgebra::UnitQuaternion::identity());
        let corners = symmetric_corners(0.03, 0.07, 0.0);
        let bounds = frustum_bounds(&observer, &corners, 0.5, 0.5);
        let pm = asymmetric_projection(&bounds, 0.5, 1000.0);
        assert!(pm[(0, 2)].abs() > 1e-6);
        // 垂直方向は中心のまま
        assert!(approx_eq_f32(pm[(1, 2)], 0.0, 1e-6));
    }

    #[test]
    fn test_near_scaling() {
        // n を半分にすると範囲も半分になるが、対角項は変わらない
        let observer = Pose::new(Vector3::new(0.0, 0.0, -1.0), nalgebra::UnitQuaternion::identity());
        let corners = symmetric_corners(0.05, 0.05, 0.0);
        let b1 = frustum_bounds(&observer, &corners, 1.0, 1.0);
        let b2 = frustum_bounds(&observer, &corners, 0.5, 1.0);
        assert!(approx_eq_f32(b2.right, b1.right / 2.0, 1e-6));
        let pm1 = asymmetric_projection(&b1, 1.0, 1000.0);
        let pm2 = asymmetric_projection(&b2, 0.5, 1000.0);
        assert!(approx_eq_f32(pm1[(0, 0)], pm2[(0, 0)], 1e-5));
    }

    #[test]
    fn test_depth_terms() {
        let bounds = FrustumBounds { left: -0.1, right: 0.1, top: 0.1, bottom: -0.1 };
        let n = 0.1;
        let f = 1000.0;
        let pm = asymmetric_projection(&bounds, n, f);
        assert!(approx_eq_f32(pm[(2, 2)], (f + n) / (n - f), 1e-6));
        assert!(approx_eq_f32(pm[(2, 3)], 2.0 * f * n / (n - f), 1e-3));
        assert_eq!(pm[(2, 0)], 0.0);
        assert_eq!(pm[(3, 3)], 0.0);
    }
}

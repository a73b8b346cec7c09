use nalgebra::Vector3;
use std::collections::VecDeque;

/// 直近Nサンプルの算術平均による位置平滑化
///
/// 固定容量のFIFO。満杯になったら最古を落としてから追加する。
/// 出力は現在入っている全サンプルの平均。
#[derive(Debug)]
pub struct SlidingWindow {
    points: VecDeque<Vector3<f32>>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// サンプルを追加して現時点の平均を返す
    pub fn push(&mut self, point: Vector3<f32>) -> Vector3<f32> {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);

        let sum: Vector3<f32> = self.points.iter().sum();
        sum / self.points.len() as f32
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_vec(a: &Vector3<f32>, b: &Vector3<f32>, eps: f32) -> bool {
        (a - b).norm() < eps
    }

    #[test]
    fn test_partial_window_averages_present_samples() {
        let mut w = SlidingWindow::new(3);
        let p1 = Vector3::new(1.0, 0.0, 0.0);
        let p2 = Vector3::new(3.0, 0.0, 0.0);
        assert_eq!(w.push(p1), p1);
        let mean = w.push(p2);
        assert!(approx_eq_vec(&mean, &Vector3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_oldest_dropped_once_full() {
        // p1..p4 -> mean(p1), mean(p1,p2), mean(p1,p2,p3), mean(p2,p3,p4)
        let mut w = SlidingWindow::new(3);
        let p1 = Vector3::new(0.0, 0.0, 0.0);
        let p2 = Vector3::new(3.0, 0.0, 0.0);
        let p3 = Vector3::new(6.0, 3.0, 0.0);
        let p4 = Vector3::new(9.0, 6.0, 3.0);

        assert!(approx_eq_vec(&w.push(p1), &p1, 1e-6));
        assert!(approx_eq_vec(&w.push(p2), &((p1 + p2) / 2.0), 1e-6));
        assert!(approx_eq_vec(&w.push(p3), &((p1 + p2 + p3) / 3.0), 1e-6));
        assert!(approx_eq_vec(&w.push(p4), &((p2 + p3 + p4) / 3.0), 1e-6));
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn test_reset() {
        let mut w = SlidingWindow::new(3);
        w.push(Vector3::new(5.0, 5.0, 5.0));
        w.reset();
        assert!(w.is_empty());
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(w.push(p), p);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut w = SlidingWindow::new(0);
        let p1 = Vector3::new(1.0, 0.0, 0.0);
        let p2 = Vector3::new(2.0, 0.0, 0.0);
        w.push(p1);
        assert_eq!(w.push(p2), p2);
    }
}

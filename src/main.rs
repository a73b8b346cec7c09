use anyhow::Result;
use holowindow::camera::Viewport;
use holowindow::config::Config;
use holowindow::math::Pose;
use holowindow::pipeline::Pipeline;
use holowindow::scene::{GeometryLayer, Ray, SceneQuery};
use holowindow::tracker::FaceSample;
use nalgebra::Vector3;

const CONFIG_PATH: &str = "config.toml";

/// 合成シーン: 深度メッシュは z = depth の壁、パススルーウィンドウは常にヒット
struct WallScene {
    depth: f32,
}

impl SceneQuery for WallScene {
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

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::load_or_default(CONFIG_PATH);

    println!("=== Holowindow - オフラインシミュレータ ===");
    println!("デバイス: {}", config.device.model);
    println!("方式: {:?}", config.render.method);
    println!();

    let viewport = Viewport::new(1170.0, 2532.0);
    let mut pipeline = Pipeline::new(&config, viewport)?;

    let scene = WallScene { depth: 3.0 };
    // 壁の手前に置いたアンカーオブジェクト
    let anchored = [Vector3::new(0.2, -0.1, 2.0)];

    // 頭を左右に振りながら60フレーム回す
    let frames = 60;
    for frame in 0..frames {
        let t = frame as f32 / frames as f32;
        let sway = (t * std::f32::consts::TAU).sin() * 0.08;
        pipeline.on_face_changed(FaceSample {
            left_eye: Vector3::new(sway - 0.03, 0.02, -0.35),
            right_eye: Vector3::new(sway + 0.03, 0.02, -0.35),
            left_openness: 1.0,
            right_openness: 1.0,
        });

        let out = pipeline.tick(&Pose::identity(), &anchored, &scene);

        if frame % 10 == 0 {
            if let Some(vp) = out.viewpoint {
                println!(
                    "frame {:3}: 視点 x: {:+.3}, 焦点距離: {:.3}m, 平面z: {:.3}, せん断: {:+.4}",
                    frame,
                    vp.device_local.x,
                    out.focus.focus,
                    out.plane_z_offset,
                    out.projection[(0, 2)],
                );
            }
        }
    }

    println!();
    println!("完了");
    Ok(())
}

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub depth: DepthConfig,
    #[serde(default)]
    pub plane: PlaneConfig,
}

/// レンダリング方式
///
/// Upr: 視点追従の正確な透視投影 / Dpr: 固定ウィンドウ近似 /
/// BiggerFov: FOV拡大 / UprDprInterpolation: 両者の補間 / Rotation: コーナースライド方式
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMethod {
    Upr,
    Dpr,
    BiggerFov,
    UprDprInterpolation,
    Rotation,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    /// 有効なレンダリング方式
    #[serde(default = "default_method")]
    pub method: RenderMethod,
    /// 視点→デバイス補間係数 (0.0..=1.0)。0でUPR、1で固定ウィンドウ
    #[serde(default = "default_interpolation")]
    pub interpolation: f32,
    /// ウィンドウコーナーのFOVスケール (>= 0)
    #[serde(default = "default_fov_scale")]
    pub fov_scale: f32,
    /// フラスタムロック(パススルーウィンドウ外に出るフレームを棄却)
    #[serde(default)]
    pub lock_to_window: bool,
    /// ファークリップ距離(メートル、レンダラ定数)
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,
    /// Rotation方式の固定ニアプレーン(メートル)
    #[serde(default = "default_rotation_near")]
    pub rotation_near: f32,
    /// Rotation方式のスライド係数
    #[serde(default = "default_slide_factor")]
    pub slide_factor: f32,
    /// Rotation方式の水平角バイアス(デバイス固有、メートル)
    #[serde(default = "default_rotation_bias_x")]
    pub rotation_bias_x: f32,
    /// Rotation方式の垂直角バイアス(デバイス固有、メートル)
    #[serde(default = "default_rotation_bias_y")]
    pub rotation_bias_y: f32,
    /// ロック判定レイの最大距離(メートル)
    #[serde(default = "default_lock_ray_max")]
    pub lock_ray_max_distance: f32,
}

fn default_method() -> RenderMethod { RenderMethod::Upr }
fn default_interpolation() -> f32 { 0.0 }
fn default_fov_scale() -> f32 { 1.0 }
fn default_far_clip() -> f32 { 1000.0 }
fn default_rotation_near() -> f32 { 0.01 }
fn default_slide_factor() -> f32 { 10.0 }
fn default_rotation_bias_x() -> f32 { 0.02125 }
fn default_rotation_bias_y() -> f32 { 0.05875 }
fn default_lock_ray_max() -> f32 { 1000.0 }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            interpolation: default_interpolation(),
            fov_scale: default_fov_scale(),
            lock_to_window: false,
            far_clip: default_far_clip(),
            rotation_near: default_rotation_near(),
            slide_factor: default_slide_factor(),
            rotation_bias_x: default_rotation_bias_x(),
            rotation_bias_y: default_rotation_bias_y(),
            lock_ray_max_distance: default_lock_ray_max(),
        }
    }
}

impl RenderConfig {
    /// 方式ごとの既定パラメータを適用して返す
    pub fn preset(method: RenderMethod) -> Self {
        let mut config = Self::default();
        config.method = method;
        if method == RenderMethod::Dpr {
            config.interpolation = 0.95;
        }
        config
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// 片目閉じ判定の開眼度比しきい値(strict比較)
    #[serde(default = "default_eye_closed_ratio")]
    pub eye_closed_ratio: f32,
    /// 平滑化スライディングウィンドウのサンプル数
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_eye_closed_ratio() -> f32 { 1.25 }
fn default_window_size() -> usize { 3 }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            eye_closed_ratio: default_eye_closed_ratio(),
            window_size: default_window_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DepthConfig {
    /// 推定値が一度も得られていない場合の焦点距離(メートル)
    #[serde(default = "default_focus")]
    pub default_focus: f32,
    /// 背景推定レイの最大距離(メートル)
    #[serde(default = "default_depth_ray_max")]
    pub ray_max_distance: f32,
    /// 背景推定を採用する距離合計の下限(これ以下は「推定不能」)
    #[serde(default = "default_min_distance_sum")]
    pub min_distance_sum: f32,
    /// アンカーオブジェクトを採用する画面中心距離の上限(ビューポート単位)
    #[serde(default = "default_center_threshold")]
    pub center_threshold: f32,
}

fn default_focus() -> f32 { 2.0 }
fn default_depth_ray_max() -> f32 { 1000.0 }
fn default_min_distance_sum() -> f32 { 2.0 }
fn default_center_threshold() -> f32 { 2000.0 }

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            default_focus: default_focus(),
            ray_max_distance: default_depth_ray_max(),
            min_distance_sum: default_min_distance_sum(),
            center_threshold: default_center_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlaneConfig {
    /// z距離の指数フィット: a * exp(-b * focus) + c (デバイスごとの実測フィット)
    #[serde(default = "default_exp_a")]
    pub exp_a: f32,
    #[serde(default = "default_exp_b")]
    pub exp_b: f32,
    #[serde(default = "default_exp_c")]
    pub exp_c: f32,
    /// デバイスカメラの水平半FOV(ラジアン、実測推定)
    #[serde(default = "default_half_fov_h")]
    pub half_fov_h: f32,
    /// デバイスカメラの垂直半FOV(ラジアン、実測推定)
    #[serde(default = "default_half_fov_v")]
    pub half_fov_v: f32,
    /// 平面の半幅(回転補正の射影用、平面ローカル単位)
    #[serde(default = "default_half_width")]
    pub half_width: f32,
    /// 平面の半高
    #[serde(default = "default_half_height")]
    pub half_height: f32,
    /// コーナー半幅の係数: 画面アスペクト比 * plane_scale / 2
    #[serde(default = "default_plane_scale")]
    pub plane_scale: f32,
}

fn default_exp_a() -> f32 { 23.5 }
fn default_exp_b() -> f32 { 1.85 }
fn default_exp_c() -> f32 { 10.0 }
fn default_half_fov_h() -> f32 { 0.464 }
fn default_half_fov_v() -> f32 { 0.588 }
fn default_half_width() -> f32 { 5.0 }
fn default_half_height() -> f32 { 6.666 }
fn default_plane_scale() -> f32 { 13.333 }

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            exp_a: default_exp_a(),
            exp_b: default_exp_b(),
            exp_c: default_exp_c(),
            half_fov_h: default_half_fov_h(),
            half_fov_v: default_half_fov_v(),
            half_width: default_half_width(),
            half_height: default_half_height(),
            plane_scale: default_plane_scale(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// 実行デバイスのモデル識別子
    #[serde(default = "default_model")]
    pub model: String,
    /// モデル識別子 → 実寸キャリブレーション(メートル)
    #[serde(default = "default_profiles")]
    pub profiles: HashMap<String, DeviceProfileConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DeviceProfileConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    /// リアカメラと画面右端の距離
    pub camera_offset_x: f32,
    /// リアカメラと画面上端の距離
    pub camera_offset_y: f32,
}

fn default_model() -> String {
    "iPhone13,3".to_string()
}

fn default_profiles() -> HashMap<String, DeviceProfileConfig> {
    let mut profiles = HashMap::new();
    // iPhone 12 Pro Max
    profiles.insert(
        "iPhone13,3".to_string(),
        DeviceProfileConfig {
            screen_width: 0.0645,
            screen_height: 0.1395,
            camera_offset_x: 0.009,
            camera_offset_y: 0.009,
        },
    );
    // iPad mini 6
    profiles.insert(
        "iPad14,1".to_string(),
        DeviceProfileConfig {
            screen_width: 0.116,
            screen_height: 0.177,
            camera_offset_x: 0.003,
            camera_offset_y: 0.003,
        },
    );
    profiles
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            profiles: default_profiles(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読み込みに失敗した場合はデフォルト値を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

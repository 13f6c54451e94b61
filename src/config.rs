use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
    #[serde(default = "CameraConfig::default_position")]
    pub position: [f32; 3],
    /// Fraction of the remaining distance the orbit target moves toward the body each frame.
    #[serde(default = "CameraConfig::default_follow_lerp")]
    pub follow_lerp: f32,
}

/// Paths for the five PBR maps applied to every body material.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyTextureConfig {
    #[serde(default)]
    pub base_color: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default)]
    pub roughness: Option<String>,
    #[serde(default)]
    pub metallic: Option<String>,
    #[serde(default)]
    pub opacity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "AssetConfig::default_body_path")]
    pub body_path: Option<String>,
    #[serde(default)]
    pub body_textures: BodyTextureConfig,
    #[serde(default = "AssetConfig::default_scale_textures")]
    pub scale_textures: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FlareEntryConfig {
    pub year: i32,
    pub seed: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlareConfig {
    #[serde(default = "FlareConfig::default_duplicates")]
    pub duplicates: u32,
    #[serde(default = "FlareConfig::default_entries")]
    pub entries: Vec<FlareEntryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "OverlayConfig::default_base_node_count")]
    pub base_node_count: u32,
    /// Fixed RNG seed for node layout; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppearanceConfig {
    /// Shows the per-region emphasis glows. Off by default; the hover indicator carries the feedback.
    #[serde(default)]
    pub hit_glow_visible: bool,
    #[serde(default = "AppearanceConfig::default_halo_enabled")]
    pub halo_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Names of the mutually exclusive info panel tabs; the first starts active.
    #[serde(default = "UiConfig::default_info_tabs")]
    pub info_tabs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub flares: FlareConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub appearance: AppearanceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ViewportConfig {
    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: Self::default_width(), height: Self::default_height() }
    }
}

impl CameraConfig {
    const fn default_fov_degrees() -> f32 {
        45.0
    }

    const fn default_near() -> f32 {
        0.1
    }

    const fn default_far() -> f32 {
        100.0
    }

    const fn default_position() -> [f32; 3] {
        [0.0, 0.3, 3.0]
    }

    const fn default_follow_lerp() -> f32 {
        0.2
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: Self::default_fov_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
            position: Self::default_position(),
            follow_lerp: Self::default_follow_lerp(),
        }
    }
}

impl Default for BodyTextureConfig {
    fn default() -> Self {
        Self {
            base_color: Some("assets/textures/BETTA_Base_Color.png".to_string()),
            normal: Some("assets/textures/BETTA_Normal_OpenGL.png".to_string()),
            roughness: Some("assets/textures/BETTA_Roughness.png".to_string()),
            metallic: Some("assets/textures/BETTA_Metallic.png".to_string()),
            opacity: Some("assets/textures/BETTA_Opacity_2.png".to_string()),
        }
    }
}

impl AssetConfig {
    fn default_body_path() -> Option<String> {
        Some("assets/betta_splendens.glb".to_string())
    }

    fn default_scale_textures() -> Vec<String> {
        vec!["assets/scales/scale1.png".to_string(), "assets/scales/scale2.png".to_string()]
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            body_path: Self::default_body_path(),
            body_textures: BodyTextureConfig::default(),
            scale_textures: Self::default_scale_textures(),
        }
    }
}

impl FlareConfig {
    const fn default_duplicates() -> u32 {
        6
    }

    fn default_entries() -> Vec<FlareEntryConfig> {
        [
            (2022, 101),
            (2024, 202),
            (2026, 303),
            (2028, 404),
            (2030, 454),
            (2032, 505),
            (2035, 606),
            (2038, 656),
            (2042, 707),
            (2045, 757),
            (2050, 808),
        ]
        .into_iter()
        .map(|(year, seed)| FlareEntryConfig { year, seed })
        .collect()
    }
}

impl Default for FlareConfig {
    fn default() -> Self {
        Self { duplicates: Self::default_duplicates(), entries: Self::default_entries() }
    }
}

impl OverlayConfig {
    const fn default_base_node_count() -> u32 {
        20
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { base_node_count: Self::default_base_node_count(), seed: None }
    }
}

impl AppearanceConfig {
    const fn default_halo_enabled() -> bool {
        true
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self { hit_glow_visible: false, halo_enabled: Self::default_halo_enabled() }
    }
}

impl UiConfig {
    fn default_info_tabs() -> Vec<String> {
        ["story", "impact", "sources"].into_iter().map(str::to_string).collect()
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { info_tabs: Self::default_info_tabs() }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.viewport.width = width;
        }
        if let Some(height) = overrides.height {
            self.viewport.height = height;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        fields
    }
}

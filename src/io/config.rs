use crate::scene::camera::ZoomLimits;
use crate::scene::light::{DirectionalLight, LightRig, PointLight, SpotLight};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value in '{path}': {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Rejects values serde accepts but the viewer cannot use.
    pub fn validate(&self) -> Result<(), String> {
        let [min, max] = self.camera.zoom_limits;
        if !(min.is_finite() && max.is_finite()) {
            return Err(format!("camera.zoom_limits must be finite, got [{min}, {max}]"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// Supersampling factor per axis.
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            title: default_title(),
        }
    }
}

fn default_width() -> usize {
    800
}
fn default_height() -> usize {
    600
}
fn default_samples() -> usize {
    1
}
fn default_title() -> String {
    "Cabin".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Set to false to leave scroll zoom unbounded.
    #[serde(default = "default_true")]
    pub clamp_zoom: bool,
    /// Field of view bounds in degrees, in either order.
    #[serde(default = "default_zoom_limits")]
    pub zoom_limits: [f32; 2],
}

impl CameraConfig {
    pub fn zoom_limits(&self) -> Option<ZoomLimits> {
        let [a, b] = self.zoom_limits;
        self.clamp_zoom.then(|| ZoomLimits::new(a, b))
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            sensitivity: default_sensitivity(),
            near: default_near(),
            far: default_far(),
            clamp_zoom: true,
            zoom_limits: default_zoom_limits(),
        }
    }
}

fn default_speed() -> f32 {
    2.5
}
fn default_sensitivity() -> f32 {
    0.1
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}
fn default_zoom_limits() -> [f32; 2] {
    [1.0, 45.0]
}

#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    /// Fixed seed for tree placement. Omit for a new forest every run.
    #[serde(default)]
    pub tree_seed: Option<u64>,
    /// Parallax depth of the stone path.
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tree_seed: None,
            height_scale: default_height_scale(),
            state_file: default_state_file(),
        }
    }
}

fn default_height_scale() -> f32 {
    0.1
}
fn default_state_file() -> String {
    "resources/program_state.txt".to_string()
}

#[derive(Debug, Deserialize)]
pub struct DirectionalLightConfig {
    pub direction: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

#[derive(Debug, Deserialize)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    /// (constant, linear, quadratic)
    #[serde(default = "default_attenuation")]
    pub attenuation: [f32; 3],
}

#[derive(Debug, Deserialize)]
pub struct SpotLightConfig {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    /// Degrees.
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    #[serde(default = "default_attenuation")]
    pub attenuation: [f32; 3],
}

fn default_attenuation() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Light overrides. Any omitted light keeps its built-in value; an empty
/// `lamps` list removes the table lamps.
#[derive(Debug, Default, Deserialize)]
pub struct LightsConfig {
    pub moonlight: Option<DirectionalLightConfig>,
    pub lamps: Option<Vec<PointLightConfig>>,
    pub spot: Option<SpotLightConfig>,
}

impl LightsConfig {
    pub fn to_rig(&self) -> LightRig {
        let mut rig = LightRig::default();

        if let Some(d) = &self.moonlight {
            rig.directional = Some(DirectionalLight {
                direction: Vector3::from(d.direction),
                ambient: Vector3::from(d.ambient),
                diffuse: Vector3::from(d.diffuse),
                specular: Vector3::from(d.specular),
            });
        }

        if let Some(lamps) = &self.lamps {
            rig.points = lamps
                .iter()
                .map(|p| PointLight {
                    position: Point3::from(p.position),
                    ambient: Vector3::from(p.ambient),
                    diffuse: Vector3::from(p.diffuse),
                    specular: Vector3::from(p.specular),
                    constant: p.attenuation[0],
                    linear: p.attenuation[1],
                    quadratic: p.attenuation[2],
                })
                .collect();
        }

        if let Some(s) = &self.spot {
            rig.spot = Some(SpotLight {
                position: Point3::from(s.position),
                direction: Vector3::from(s.direction),
                cut_off: s.cut_off,
                outer_cut_off: s.outer_cut_off,
                constant: s.attenuation[0],
                linear: s.attenuation[1],
                quadratic: s.attenuation[2],
                ambient: Vector3::from(s.ambient),
                diffuse: Vector3::from(s.diffuse),
                specular: Vector3::from(s.specular),
            });
        }

        rig
    }
}

#[derive(Debug, Deserialize)]
pub struct AssetsConfig {
    /// Set to false to render the generated placeholder scene.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_asset_root")]
    pub root: String,
    #[serde(default = "default_skybox_dir")]
    pub skybox_dir: String,
    /// Prop name -> OBJ path relative to `root`.
    #[serde(default)]
    pub models: BTreeMap<String, String>,
    /// Texture name -> image path relative to `root`.
    #[serde(default)]
    pub textures: BTreeMap<String, String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: default_asset_root(),
            skybox_dir: default_skybox_dir(),
            models: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_asset_root() -> String {
    "resources".to_string()
}
fn default_skybox_dir() -> String {
    "textures/skybox".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.camera.zoom_limits(), Some(ZoomLimits { min: 1.0, max: 45.0 }));
        assert!(config.scene.tree_seed.is_none());
        assert_eq!(config.lights.to_rig(), LightRig::default());
    }

    #[test]
    fn light_overrides_replace_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scene]
            tree_seed = 99

            [lights]
            lamps = []

            [lights.spot]
            position = [0.0, 3.0, 0.0]
            direction = [0.0, -1.0, 0.0]
            cut_off = 12.5
            outer_cut_off = 17.5
            ambient = [0.0, 0.0, 0.0]
            diffuse = [1.0, 1.0, 1.0]
            specular = [1.0, 1.0, 1.0]
            "#,
        )
        .unwrap();

        let rig = config.lights.to_rig();
        assert!(rig.points.is_empty());
        assert!(rig.directional.is_some());
        let spot = rig.spot.unwrap();
        assert_eq!(spot.cut_off, 12.5);
        assert_eq!((spot.constant, spot.linear, spot.quadratic), (1.0, 1.0, 1.0));
        assert_eq!(config.scene.tree_seed, Some(99));
    }

    #[test]
    fn zoom_clamp_can_be_switched_off() {
        let config: Config = toml::from_str("[camera]\nclamp_zoom = false\n").unwrap();
        assert_eq!(config.camera.zoom_limits(), None);

        let config: Config = toml::from_str("[camera]\nspeed = 2.5\n").unwrap();
        assert_eq!(config.camera.zoom_limits(), Some(ZoomLimits { min: 1.0, max: 45.0 }));
    }

    #[test]
    fn inverted_zoom_limits_are_reordered() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\nzoom_limits = [45.0, 1.0]").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.camera.zoom_limits(), Some(ZoomLimits { min: 1.0, max: 45.0 }));

        let mut camera = crate::scene::camera::Camera::default();
        camera.zoom_limits = config.camera.zoom_limits();
        camera.process_mouse_scroll(1.0);
        assert_eq!(camera.zoom, 44.0);
    }

    #[test]
    fn non_finite_zoom_limits_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\nzoom_limits = [nan, 45.0]").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\nwidth = \"wide\"").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(file.path().with_extension("missing")),
            Err(ConfigError::Read { .. })
        ));
    }
}

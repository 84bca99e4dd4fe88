use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{bail, ensure, Error, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    color::{self, Rgb},
    rotation::Orientation,
};

/// Field of view the default camera is placed for, in degrees.
const DEFAULT_FOV: f32 = 60.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ContourConfig {
    /// Largest bounding box extent meshes are scaled to when loaded.
    pub normalize_size: f32,
    pub slice: SliceConfig,
    pub export: ExportConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SliceConfig {
    /// Distance between neighboring cutting planes.
    pub spacing: f32,
    /// Distance under which two points are considered the same when stitching
    /// segments into contours.
    pub tolerance: f32,
    pub stitch: StitchMode,
    /// Rotation of the cutting-plane family, independent of the display
    /// rotation.
    pub orientation: Orientation,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Rotation of the model about the X axis before projecting, in degrees.
    pub display_rotation: f32,
    pub stroke_width: f32,
    pub stroke_color: Rgb,
    /// Only used with [`RenderMode::Filled`].
    pub fill_color: Rgb,
    pub render_mode: RenderMode,
    /// Size of the exported document in pixels.
    pub viewport: Vector2<u32>,
    /// Projection constant (`k`) of the perspective divide.
    pub focal_length: f32,
    /// Distance from the camera to the model origin along +Z.
    pub camera_distance: f32,
    /// Drop collinear points from contours before projecting.
    pub simplify: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StitchMode {
    /// Scan every unused segment for each step, quadratic in segment count.
    #[default]
    Linear,
    /// Look up segment endpoints in a hash of quantized coordinates.
    Hashed,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Outline,
    /// Contours are filled so nearer ones hide the ones behind them.
    Filled,
}

impl ContourConfig {
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load config, using defaults: {}", err);
                ContourConfig::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(if path.exists() {
            let file = fs::read(path)?;
            let string = String::from_utf8_lossy(&file);
            let config = toml::from_str(&string)?;
            info!("Successfully loaded config file `{}`", path.display());
            config
        } else {
            info!("No config file found, using defaults");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let string = toml::to_string(self)?;
        fs::write(path, string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.slice.validate()?;
        self.export.validate()?;
        ensure!(
            self.normalize_size.is_finite() && self.normalize_size > 0.0,
            "Normalize size must be positive, got {}",
            self.normalize_size
        );
        Ok(())
    }
}

impl SliceConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.spacing.is_finite() && self.spacing > 0.0,
            "Slice spacing must be positive, got {}",
            self.spacing
        );
        ensure!(
            self.tolerance.is_finite() && self.tolerance > 0.0,
            "Stitch tolerance must be positive, got {}",
            self.tolerance
        );
        ensure!(
            self.orientation.is_finite(),
            "Plane orientation must be finite, got {:?}",
            self.orientation
        );
        Ok(())
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.stroke_width.is_finite() && self.stroke_width > 0.0,
            "Stroke width must be positive, got {}",
            self.stroke_width
        );
        ensure!(
            self.display_rotation.is_finite(),
            "Display rotation must be finite"
        );
        ensure!(
            self.viewport.x > 0 && self.viewport.y > 0,
            "Viewport must not be empty, got {}x{}",
            self.viewport.x,
            self.viewport.y
        );
        for (name, value) in [
            ("Focal length", self.focal_length),
            ("Camera distance", self.camera_distance),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be positive, got {value}"
            );
        }
        Ok(())
    }

    pub fn center(&self) -> Vector2<f32> {
        self.viewport.map(|x| x as f32 / 2.0)
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            tolerance: 1e-3,
            stitch: StitchMode::Linear,
            orientation: Orientation::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        let viewport = Vector2::new(600, 600);
        // Places the camera so the z = 0 plane maps one unit to one pixel.
        let distance = (viewport.y as f32 / 2.0) / (DEFAULT_FOV / 2.0).to_radians().tan();

        Self {
            display_rotation: 0.0,
            stroke_width: 1.0,
            stroke_color: color::BLACK,
            fill_color: color::WHITE,
            render_mode: RenderMode::Outline,
            viewport,
            focal_length: distance,
            camera_distance: distance,
            simplify: false,
        }
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            normalize_size: 200.0,
            slice: SliceConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl FromStr for StitchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "linear" => Self::Linear,
            "hashed" => Self::Hashed,
            _ => bail!("Unknown stitch mode `{s}`, expected linear or hashed"),
        })
    }
}

impl fmt::Display for StitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Hashed => "hashed",
        })
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "outline" => Self::Outline,
            "filled" | "fill" => Self::Filled,
            _ => bail!("Unknown render mode `{s}`, expected outline or filled"),
        })
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outline => "outline",
            Self::Filled => "filled",
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    #[test]
    fn defaults_are_valid() {
        ContourConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_spacing() {
        for spacing in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = SliceConfig {
                spacing,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{spacing} accepted");
        }
    }

    #[test]
    fn rejects_bad_export() {
        let mut config = ExportConfig {
            stroke_width: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.stroke_width = 1.0;
        config.camera_distance = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_camera() {
        let config = ExportConfig::default();
        assert!((config.camera_distance - 519.615).abs() < 0.01);
        assert_eq!(config.center(), Vector2::new(300.0, 300.0));
    }

    #[test]
    fn partial_toml() {
        let config: ContourConfig = toml::from_str(
            r##"
            [slice]
            spacing = 2.5
            stitch = "Hashed"
            orientation = { x = 45.0 }

            [export]
            stroke_color = "#ff0000"
            render_mode = "Filled"
            "##,
        )
        .unwrap();

        assert_eq!(config.slice.spacing, 2.5);
        assert_eq!(config.slice.stitch, StitchMode::Hashed);
        assert_eq!(config.slice.orientation, Orientation::new(45.0, 0.0, 0.0));
        assert_eq!(config.slice.tolerance, 1e-3);
        assert_eq!(config.export.stroke_color, Rgb::new(255, 0, 0));
        assert_eq!(config.export.render_mode, RenderMode::Filled);
        assert_eq!(config.normalize_size, 200.0);
    }

    #[test]
    fn save_and_load() {
        let dir = env::temp_dir().join(format!("contour-config-{}", process::id()));
        let path = dir.join("config.toml");

        let mut config = ContourConfig::default();
        config.slice.spacing = 4.0;
        config.export.fill_color = Rgb::new(1, 2, 3);
        config.save(&path).unwrap();

        assert_eq!(ContourConfig::load(&path).unwrap(), config);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = env::temp_dir().join("contour-config-does-not-exist.toml");
        assert_eq!(ContourConfig::load_or_default(&path), ContourConfig::default());
    }

    #[test]
    fn mode_names() {
        assert_eq!("Hashed".parse::<StitchMode>().unwrap(), StitchMode::Hashed);
        assert_eq!("fill".parse::<RenderMode>().unwrap(), RenderMode::Filled);
        assert!("dotted".parse::<RenderMode>().is_err());
        assert_eq!(RenderMode::Outline.to_string(), "outline");
    }
}

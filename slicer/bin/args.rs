use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Parser;
use common::{
    color::Rgb,
    config::{ContourConfig, RenderMode, StitchMode},
    rotation::Orientation,
};
use nalgebra::{ArrayStorage, Const, Matrix, Scalar, Vector3, U1};
use num_traits::Zero;

#[derive(Debug, Parser)]
/// Slices a mesh into parallel contours and draws them as an SVG.
pub struct Args {
    #[arg(long)]
    /// Path to a TOML config file. Any flags given override its values.
    pub config: Option<PathBuf>,

    #[arg(long)]
    /// Distance between neighboring cutting planes, in normalized units.
    pub spacing: Option<f32>,
    #[arg(long, value_parser = vector_value_parser::<f32, 3>)]
    /// Rotation of the cutting planes in degrees about the X, Y, and Z axes.
    pub plane_rotation: Option<Vector3<f32>>,
    #[arg(long)]
    /// How segments are joined into contours (linear or hashed).
    pub stitch: Option<StitchMode>,
    #[arg(long)]
    /// Size of the largest bounding box extent the mesh is scaled to.
    pub size: Option<f32>,

    #[arg(long)]
    /// Rotation of the model about the X axis before drawing, in degrees.
    pub rotation: Option<f32>,
    #[arg(long)]
    /// Width of the contour lines.
    pub stroke_width: Option<f32>,
    #[arg(long)]
    /// Color of the contour lines, as `#rrggbb`.
    pub color: Option<Rgb>,
    #[arg(long)]
    /// Color contours are filled with in filled mode, as `#rrggbb`.
    pub fill_color: Option<Rgb>,
    #[arg(long)]
    /// Draw contours as outlines or as filled shapes that hide the ones
    /// behind them (outline or filled).
    pub mode: Option<RenderMode>,
    #[arg(long)]
    /// Drop collinear points from contours before drawing.
    pub simplify: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    /// Log more details, can be repeated.
    pub verbose: u8,

    /// Path to a .stl or .obj file.
    pub mesh: PathBuf,
    /// File to save the drawing to.
    pub output: PathBuf,
}

impl Args {
    /// Loads the config file, if any, and applies the flags over it.
    pub fn contour_config(&self) -> Result<ContourConfig> {
        let mut config = match &self.config {
            Some(path) => ContourConfig::load(path)
                .with_context(|| format!("Failed to load config `{}`", path.display()))?,
            None => ContourConfig::default(),
        };

        let slice = &mut config.slice;
        override_with(&mut slice.spacing, self.spacing);
        override_with(&mut slice.stitch, self.stitch);
        override_with(
            &mut slice.orientation,
            self.plane_rotation.map(Orientation::from),
        );

        let export = &mut config.export;
        override_with(&mut export.display_rotation, self.rotation);
        override_with(&mut export.stroke_width, self.stroke_width);
        override_with(&mut export.stroke_color, self.color);
        override_with(&mut export.fill_color, self.fill_color);
        override_with(&mut export.render_mode, self.mode);
        export.simplify |= self.simplify;

        override_with(&mut config.normalize_size, self.size);

        config.validate().context("Invalid config")?;
        Ok(config)
    }
}

fn override_with<T>(value: &mut T, flag: Option<T>) {
    if let Some(flag) = flag {
        *value = flag;
    }
}

fn vector_value_parser<T, const N: usize>(
    raw: &str,
) -> Result<Matrix<T, Const<N>, U1, ArrayStorage<T, N, 1>>>
where
    T: FromStr + Scalar + Zero,
    T::Err: Send + Sync + std::error::Error,
{
    let mut vec = Matrix::<T, Const<N>, U1, ArrayStorage<T, N, 1>>::zeros();

    let mut parts = raw.splitn(N, ',');
    for i in 0..N {
        let element = parts.next().context("Missing vector element")?.trim();
        vec[i] = element
            .parse()
            .context("Can't convert element from string")?;
    }

    Ok(vec)
}

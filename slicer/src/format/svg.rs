use std::path::Path as FsPath;

use anyhow::{Context, Result};
use common::config::{ExportConfig, RenderMode};
use svg::{
    node::element::{path::Data, Group, Path},
    Document,
};
use tracing::{debug, info};

use super::{ProjectedPath, Projector};
use crate::slicer::SliceLayer;

/// Projects every contour of `layers` and draws them into a single document,
/// farthest contours first.
pub fn export_svg(layers: &[SliceLayer], config: &ExportConfig) -> Document {
    let paths = Projector::new(config).project_layers(layers);
    debug!("Exporting {} paths from {} layers", paths.len(), layers.len());
    build_document(&paths, config)
}

/// Draws already projected and ordered paths.
pub fn build_document(paths: &[ProjectedPath], config: &ExportConfig) -> Document {
    let (width, height) = (config.viewport.x, config.viewport.y);

    let mut group = Group::new()
        .set("stroke", config.stroke_color.to_hex())
        .set("stroke-width", config.stroke_width)
        .set("stroke-linejoin", "round")
        .set("fill", "none");

    for path in paths {
        let Some((first, rest)) = path.points.split_first() else {
            continue;
        };

        let mut data = Data::new().move_to((first.x, first.y));
        for point in rest {
            data = data.line_to((point.x, point.y));
        }
        if path.closed {
            data = data.close();
        }

        let mut element = Path::new().set("d", data);
        if config.render_mode == RenderMode::Filled {
            element = element.set("fill", config.fill_color.to_hex());
        }
        group = group.add(element);
    }

    Document::new()
        .set("viewBox", (0, 0, width, height))
        .set("width", width)
        .set("height", height)
        .add(group)
}

pub fn save_svg(path: &FsPath, document: &Document) -> Result<()> {
    svg::save(path, document)
        .with_context(|| format!("Failed to write `{}`", path.display()))?;
    info!("Saved drawing to `{}`", path.display());
    Ok(())
}

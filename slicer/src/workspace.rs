use anyhow::Result;
use common::config::ContourConfig;
use parking_lot::RwLock;
use svg::Document;
use tracing::{debug, info};

use crate::{
    format::svg::export_svg,
    mesh::Mesh,
    slicer::{SliceLayer, Slicer},
    Pos,
};

/// Something contours can be drawn onto as they are produced, such as a
/// window. Points are in model space.
pub trait RenderSurface {
    fn begin_frame(&mut self);
    fn draw_polyline(&mut self, points: &[Pos], closed: bool);
    fn end_frame(&mut self);
}

/// Holds the active mesh and the config every pass runs with. Each pass works
/// on a snapshot taken under the lock, so a mesh or config swapped while a
/// pass is running only affects the next one.
pub struct Workspace {
    state: RwLock<State>,
}

struct State {
    mesh: Option<Mesh>,
    config: ContourConfig,
}

impl Workspace {
    pub fn new(config: ContourConfig) -> Self {
        Self {
            state: RwLock::new(State { mesh: None, config }),
        }
    }

    /// Replaces the active mesh.
    pub fn load_mesh(&self, mesh: Mesh) {
        info!(
            "Loaded mesh. {{ vert: {}, face: {} }}",
            mesh.vertex_count(),
            mesh.face_count()
        );
        self.state.write().mesh = Some(mesh);
    }

    pub fn clear_mesh(&self) {
        self.state.write().mesh = None;
    }

    pub fn has_mesh(&self) -> bool {
        self.state.read().mesh.is_some()
    }

    pub fn config(&self) -> ContourConfig {
        self.state.read().config.clone()
    }

    /// Replaces the config if it is valid, otherwise keeps the current one.
    pub fn set_config(&self, config: ContourConfig) -> Result<()> {
        config.validate()?;
        self.state.write().config = config;
        Ok(())
    }

    /// The active mesh along with the config it should be processed with.
    pub fn snapshot(&self) -> Option<(Mesh, ContourConfig)> {
        let state = self.state.read();
        let mesh = state.mesh.clone()?;
        Some((mesh, state.config.clone()))
    }

    pub fn slice(&self) -> Vec<SliceLayer> {
        let Some((mesh, config)) = self.snapshot() else {
            debug!("No mesh loaded, nothing to slice");
            return Vec::new();
        };

        Slicer::new(config.slice, mesh).slice()
    }

    /// Slices the active mesh and draws every contour onto `surface`. Nothing
    /// is drawn, not even an empty frame, when no mesh is loaded.
    pub fn render_frame(&self, surface: &mut impl RenderSurface) {
        let Some((mesh, config)) = self.snapshot() else {
            return;
        };

        let layers = Slicer::new(config.slice, mesh).slice();
        surface.begin_frame();
        for contour in layers.iter().flat_map(|x| x.contours.iter()) {
            surface.draw_polyline(contour.points(), contour.is_closed());
        }
        surface.end_frame();
    }

    /// Slices the active mesh and flattens it into an SVG document. Without a
    /// mesh the document has no paths.
    pub fn export_svg(&self) -> Document {
        let (layers, config) = match self.snapshot() {
            Some((mesh, config)) => (Slicer::new(config.slice.clone(), mesh).slice(), config),
            None => (Vec::new(), self.config()),
        };

        export_svg(&layers, &config.export)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(ContourConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::cube;

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        open: bool,
        polylines: Vec<(usize, bool)>,
    }

    impl RenderSurface for Recorder {
        fn begin_frame(&mut self) {
            assert!(!self.open);
            self.open = true;
        }

        fn draw_polyline(&mut self, points: &[Pos], closed: bool) {
            assert!(self.open);
            self.polylines.push((points.len(), closed));
        }

        fn end_frame(&mut self) {
            assert!(self.open);
            self.open = false;
            self.frames += 1;
        }
    }

    fn workspace() -> Workspace {
        let mut config = ContourConfig::default();
        config.slice.spacing = 0.5;
        let workspace = Workspace::new(config);
        workspace.load_mesh(cube(0.5));
        workspace
    }

    #[test]
    fn no_mesh() {
        let workspace = Workspace::default();
        assert!(!workspace.has_mesh());
        assert!(workspace.snapshot().is_none());
        assert!(workspace.slice().is_empty());

        let mut recorder = Recorder::default();
        workspace.render_frame(&mut recorder);
        assert_eq!(recorder.frames, 0);
        assert!(recorder.polylines.is_empty());

        let document = workspace.export_svg().to_string();
        assert_eq!(document.matches("<path").count(), 0);
    }

    #[test]
    fn render_cube() {
        let workspace = workspace();
        let mut recorder = Recorder::default();
        workspace.render_frame(&mut recorder);

        assert_eq!(recorder.frames, 1);
        assert_eq!(recorder.polylines.len(), 2);
        assert!(recorder.polylines.iter().all(|&(len, closed)| closed && len >= 4));
    }

    #[test]
    fn export_cube() {
        let document = workspace().export_svg().to_string();
        assert_eq!(document.matches("<path").count(), 2);
    }

    #[test]
    fn clear_mesh() {
        let workspace = workspace();
        assert_eq!(workspace.slice().len(), 2);

        workspace.clear_mesh();
        assert!(!workspace.has_mesh());
        assert!(workspace.slice().is_empty());
    }

    #[test]
    fn invalid_config_kept_out() {
        let workspace = workspace();
        let mut config = workspace.config();
        config.slice.spacing = -1.0;

        assert!(workspace.set_config(config).is_err());
        assert_eq!(workspace.config().slice.spacing, 0.5);

        let mut config = workspace.config();
        config.slice.spacing = 0.3;
        workspace.set_config(config).unwrap();
        assert_eq!(workspace.slice().len(), 3);
    }
}

use std::{fs::File, io::BufReader, time::Instant};

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use contour_slicer::{
    format::svg::{export_svg, save_svg},
    mesh::load_mesh,
    workspace::Workspace,
};

mod args;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target("contour_slicer", level)
        .with_target("common", level);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.contour_config()?;

    let ext = args
        .mesh
        .extension()
        .context("Mesh path has no extension")?
        .to_string_lossy();
    let buf = BufReader::new(
        File::open(&args.mesh)
            .with_context(|| format!("Failed to open `{}`", args.mesh.display()))?,
    );
    let mesh = load_mesh(buf, &ext)?.normalized(config.normalize_size);

    println!(
        "Loaded `{}`. {{ vert: {}, face: {} }}",
        args.mesh.display(),
        mesh.vertex_count(),
        mesh.face_count()
    );

    let now = Instant::now();

    let workspace = Workspace::new(config);
    workspace.load_mesh(mesh);

    let layers = workspace.slice();
    let contours = layers.iter().map(|x| x.contours.len()).sum::<usize>();
    let open = layers
        .iter()
        .flat_map(|x| x.contours.iter())
        .filter(|x| !x.is_closed())
        .count();
    println!("Sliced {} layers into {contours} contours ({open} open)", layers.len());

    let document = export_svg(&layers, &workspace.config().export);
    save_svg(&args.output, &document)?;

    println!("Done. Elapsed: {:.1}s", now.elapsed().as_secs_f32());

    Ok(())
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fortunes::{lloyd_relax, ClipWindow, Point, WingedEdge};
use tracing_subscriber::fmt::SubscriberBuilder;

mod input;

/// Compute a planar Voronoi diagram from a point file, optionally Lloyd-relaxed.
#[derive(Parser)]
#[command(name = "voronoi-cli")]
struct Cmd {
    /// Point file: one `x,y` site per line; blank lines and `//` comments ignored.
    input: PathBuf,

    /// Length unbounded rays are extended to when materializing cell boundaries.
    #[arg(long, default_value_t = 1000.0)]
    ray_length: f64,

    /// Number of Lloyd relaxation iterations to run after the initial sweep.
    #[arg(long, default_value_t = 0)]
    lloyd_iterations: u32,

    /// Step fraction toward the centroid, per Lloyd iteration.
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    /// Clip window for Lloyd relaxation, as `x_min,y_min,x_max,y_max`.
    /// Defaults to the input sites' bounding box, padded by `ray_length`.
    #[arg(long)]
    window: Option<String>,

    /// Print each real cell's materialized vertex list.
    #[arg(long)]
    dump_vertices: bool,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();

    let sites = input::read_points_file(&cmd.input)?;
    tracing::info!(n = sites.len(), file = %cmd.input.display(), "loaded sites");

    let mut we = fortunes::compute_voronoi(&sites).context("computing voronoi diagram")?;

    if cmd.lloyd_iterations > 0 {
        let window = resolve_window(cmd.window.as_deref(), &sites, cmd.ray_length)?;
        for i in 0..cmd.lloyd_iterations {
            we = lloyd_relax(&we, cmd.ray_length, &window, cmd.alpha)
                .with_context(|| format!("lloyd iteration {i}"))?;
            tracing::info!(iteration = i, "lloyd step complete");
        }
    }

    print_summary(&we, cmd.ray_length, cmd.dump_vertices);
    Ok(())
}

fn resolve_window(spec: Option<&str>, sites: &[Point], ray_length: f64) -> Result<ClipWindow> {
    if let Some(spec) = spec {
        return parse_window(spec);
    }
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for s in sites {
        x_min = x_min.min(s.x());
        y_min = y_min.min(s.y());
        x_max = x_max.max(s.x());
        y_max = y_max.max(s.y());
    }
    let pad = ray_length.max(1.0);
    Ok(ClipWindow::rectangle(
        Point::from_xy(x_min - pad, y_max + pad),
        Point::from_xy(x_max + pad, y_min - pad),
    ))
}

fn parse_window(spec: &str) -> Result<ClipWindow> {
    let parts: Vec<f64> = spec
        .split(',')
        .map(|s| s.trim().parse::<f64>().map_err(anyhow::Error::from))
        .collect::<Result<_>>()
        .context("parsing --window as x_min,y_min,x_max,y_max")?;
    let &[x_min, y_min, x_max, y_max] = parts.as_slice() else {
        bail!("--window expects exactly 4 comma-separated numbers, got {}", parts.len());
    };
    Ok(ClipWindow::rectangle(
        Point::from_xy(x_min, y_max),
        Point::from_xy(x_max, y_min),
    ))
}

fn print_summary(we: &WingedEdge, ray_length: f64, dump_vertices: bool) {
    let real_polys = we.polygons().filter(|(_, p)| !p.at_infinity).count();
    let real_edges = we.edges().filter(|(_, e)| !e.at_infinity_edge).count();
    let finite_vertices = we.vertices().filter(|(_, v)| !v.at_infinity).count();

    println!("cells:           {real_polys}");
    println!("bisector edges:  {real_edges}");
    println!("finite vertices: {finite_vertices}");

    if dump_vertices {
        for (id, poly) in we.polygons() {
            if poly.at_infinity {
                continue;
            }
            let site = poly.site.expect("non-infinity polygon always has a site");
            let verts = we.real_vertices(id, ray_length);
            let rendered: Vec<String> = verts.iter().map(|p| format!("({:.3}, {:.3})", p.x(), p.y())).collect();
            println!("site ({:.3}, {:.3}): [{}]", site.x(), site.y(), rendered.join(", "));
        }
    }
}

//! Tessel CLI - polygon mesh triangulation tool.
//!
//! Usage: tessel <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `tessel --help` for available commands. Set `RUST_LOG` or pass `-v`
//! for diagnostic output.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};

use tessel::algo::triangulate::{triangulate_with_progress, TriangulateOptions};
use tessel::algo::Progress;
use tessel::io;
use tessel::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "tessel")]
#[command(author, version, about = "Minimum-weight polygon mesh triangulation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Replace every polygon face by triangles
    Triangulate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Skip faces with more sides than this
        #[arg(long)]
        max_degree: Option<usize>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,
        Commands::Triangulate {
            input,
            output,
            max_degree,
            sequential,
        } => cmd_triangulate(&input, &output, max_degree, sequential)?,
    }
    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only redraw when the bar moves forward
        if max_percent.fetch_max(percent, Ordering::Relaxed) >= percent && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn print_degree_histogram(mesh: &HalfEdgeMesh) {
    let mut counts: Vec<usize> = Vec::new();
    for f in mesh.face_ids() {
        let degree = mesh.face_degree(f);
        if counts.len() <= degree {
            counts.resize(degree + 1, 0);
        }
        counts[degree] += 1;
    }

    println!("Face degrees:");
    for (degree, &count) in counts.iter().enumerate().filter(|&(_, &c)| c > 0) {
        println!("  {:>4}-gon: {}", degree, count);
    }
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());
    println!("Surface area: {:.6}", mesh.surface_area());

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else {
        println!("Mesh type: Polygon mesh");
    }
    print_degree_histogram(&mesh);

    let boundary = mesh
        .vertex_ids()
        .filter(|&v| !mesh.is_isolated(v) && mesh.is_boundary_vertex(v))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }

    let non_manifold = mesh.vertex_ids().filter(|&v| !mesh.is_manifold(v)).count();
    if non_manifold > 0 {
        println!("Non-manifold vertices: {}", non_manifold);
    }

    Ok(())
}

fn cmd_triangulate(
    input: &PathBuf,
    output: &PathBuf,
    max_degree: Option<usize>,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let mut options = TriangulateOptions::default().with_parallel(!sequential);
    if let Some(max) = max_degree {
        options = options.with_max_face_degree(max);
    }

    let mode = if sequential { "sequential" } else { "parallel" };
    println!("Triangulating ({})...", mode);

    let progress = create_progress();
    let start = Instant::now();
    let report = triangulate_with_progress(&mut mesh, &options, &progress)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} faces triangulated, {} triangles added ({:.2?})",
        report.faces_triangulated, report.triangles_added, elapsed
    );
    if report.num_skipped() > 0 {
        println!(
            "Skipped: {} non-manifold, {} unsatisfiable, {} too large, {} failed",
            report.skipped_non_manifold,
            report.skipped_unsatisfiable,
            report.skipped_too_large,
            report.failed
        );
    }
    if report.replanned > 0 {
        println!("Replanned: {} faces", report.replanned);
    }

    io::save(&mesh, output)?;
    println!("Saved to: {}", output.display());

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};

use flpz::config::{Config, MapJob};
use flpz::physics::fitting::{self, plot};
use flpz::physics::operations::{conversion, rprim, supercell};
use flpz::utils::{geometry, logger, report};
use flpz::{io, map_atoms_observed, FlpzError, MatchPolicy, Result};

#[derive(Parser)]
#[command(name = "flpz")]
#[command(about = "Cell mapping and lattice utilities for DFT workflows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Nearest,
    LastMatch,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Nearest => MatchPolicy::Nearest,
            PolicyArg::LastMatch => MatchPolicy::LastMatch,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Map target-cell atoms onto origin-cell atoms
    Map {
        /// Origin cell (JSON, POSCAR or plain text)
        #[arg(required_unless_present = "job")]
        origin: Option<PathBuf>,

        /// Target cell (JSON, POSCAR or plain text)
        #[arg(required_unless_present = "job")]
        target: Option<PathBuf>,

        /// JSON job file holding both cells and optional settings
        #[arg(long, conflicts_with_all = ["origin", "target"])]
        job: Option<PathBuf>,

        /// Matching tolerance in Angstrom
        #[arg(long)]
        tolerance: Option<f64>,

        /// Replication radius of the image stencil
        #[arg(long)]
        radius: Option<u32>,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Print the result as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Do not print one trace line per match
        #[arg(long)]
        no_trace: bool,
    },
    /// Build a diagonal supercell and print it as JSON
    Supercell {
        cell: PathBuf,
        nx: u32,
        ny: u32,
        nz: u32,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert between Cartesian (xcart) and reduced (xred) coordinates
    Convert {
        /// "xred" (Cartesian in) or "xcart" (reduced in)
        mode: String,
        /// Nine numbers, rows are the primitive vectors
        #[arg(allow_hyphen_values = true)]
        rprim: String,
        /// 3 * natom numbers
        #[arg(allow_hyphen_values = true)]
        coords: String,
        acella: f64,
        acellb: f64,
        acellc: f64,
        natom: usize,
    },
    /// Angle between two vectors, in degrees
    Angle {
        #[arg(allow_hyphen_values = true)]
        vector1: String,
        #[arg(allow_hyphen_values = true)]
        vector2: String,
    },
    /// Rearrange and, when rows are orthogonal, diagonalize an rprim matrix
    Rprim {
        #[arg(allow_hyphen_values = true)]
        rprim: String,
    },
    /// Stepwise polynomial surface fit of x y z data
    Fit {
        data: PathBuf,
        /// Terms such as x^2 y^2 x^4 x^2y^2
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
        #[arg(long)]
        no_plots: bool,
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },
    /// Show the settings file, or write the defaults with --init
    Config {
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = logger::init(level) {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Some(threads) = cli.threads {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            Ok(()) => info!("Using {} threads", threads),
            Err(e) => warn!("Failed to set thread pool size: {}", e),
        }
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let (config, status) = Config::load();
    match command {
        // A broken settings file must not stop `config --init` from replacing it.
        Commands::Config { init: true } if status.is_failed() => warn!("{}", status),
        _ if status.is_failed() => return Err(FlpzError::MalformedInput(status.to_string())),
        _ => log::debug!("{}", status),
    }

    match command {
        Commands::Map {
            origin,
            target,
            job,
            tolerance,
            radius,
            policy,
            json,
            no_trace,
        } => {
            let base = config.map_options();
            let (job, mut options) = match job {
                Some(path) => {
                    let job = io::load_job(&path)?;
                    let opts = job.options(base);
                    (job, opts)
                }
                None => {
                    let (Some(o), Some(t)) = (origin, target) else {
                        return Err(FlpzError::MalformedInput(
                            "map needs an origin and a target cell".to_string(),
                        ));
                    };
                    let job = MapJob {
                        origin: io::load_cell(&o)?,
                        target: io::load_cell(&t)?,
                        tolerance: None,
                        replication_radius: None,
                        policy: None,
                    };
                    (job, base)
                }
            };
            if let Some(t) = tolerance {
                options.tolerance = t;
            }
            if let Some(r) = radius {
                options.replication_radius = r;
            }
            if let Some(p) = policy {
                options.policy = p.into();
            }

            if !json {
                print!("{}", report::cell_summary(&job.origin, "Origin"));
                print!("{}", report::cell_summary(&job.target, "Target"));
                println!();
            }

            let trace = !(json || no_trace);
            let result = map_atoms_observed(&job.origin, &job.target, &options, |ev| {
                if trace {
                    println!("{}", report::match_trace(ev));
                }
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!();
                print!("{}", report::legacy_arrays(&result));
                println!();
                print!("{}", report::mapping_table(&result, &job.target));
            }
            if !result.unmatched().is_empty() {
                warn!("{} target atoms have no origin image within {} Å", result.unmatched().len(), options.tolerance);
            }
        }

        Commands::Supercell { cell, nx, ny, nz, output } => {
            let cell = io::load_cell(&cell)?;
            cell.validate("input")?;
            let sc = supercell::build(&cell, nx, ny, nz)?;
            let text = serde_json::to_string_pretty(&sc)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    info!("Wrote {} ({} atoms)", path.display(), sc.atoms.len());
                }
                None => println!("{}", text),
            }
        }

        Commands::Convert {
            mode,
            rprim,
            coords,
            acella,
            acellb,
            acellc,
            natom,
        } => {
            let mode: conversion::CoordMode = mode.parse()?;
            let rprim = conversion::parse_rprim(&rprim)?;
            let coords = conversion::parse_coords(&coords, natom)?;
            let out = conversion::convert(mode, &coords, rprim, [acella, acellb, acellc])?;
            println!("{}", conversion::format_rows(&out));
        }

        Commands::Angle { vector1, vector2 } => {
            let v1 = geometry::parse_vector(&vector1)?;
            let v2 = geometry::parse_vector(&vector2)?;
            println!("{:.6}", geometry::angle_between(&v1, &v2)?);
        }

        Commands::Rprim { rprim: text } => {
            let m = conversion::parse_rprim(&text)?;
            println!("{}", rprim::format_matrix(rprim::canonicalize(m)));
        }

        Commands::Fit {
            data,
            terms,
            no_plots,
            plot_dir,
        } => {
            let terms = fitting::parse_terms(&terms.join(" "))?;
            let samples = io::columns::load_scatter(&data)?;
            let fit = fitting::fit_surface(&samples, &terms)?;
            print!("{}", report::fit_summary(&fit));

            if config.fit_plots && !no_plots {
                let dir = plot_dir.unwrap_or(config.plot_dir);
                std::fs::create_dir_all(&dir)?;

                for axis_fit in [&fit.x_fit, &fit.y_fit] {
                    if axis_fit.steps.is_empty() {
                        continue;
                    }
                    let name = format!("2d_fit_{}.png", axis_fit.axis.label().to_lowercase());
                    let path = dir.join(name);
                    match plot::save_axis_plot(&path, axis_fit) {
                        Ok(()) => info!("Saved {}", path.display()),
                        Err(e) => warn!("{}", e),
                    }
                }

                let path = dir.join("surface_fit.png");
                match plot::save_surface_plot(&path, &fit.scaled, &fit.surface) {
                    Ok(()) => info!("Saved {}", path.display()),
                    Err(e) => warn!("{}", e),
                }
            }
        }

        Commands::Config { init } => {
            if init {
                info!("{}", Config::default().save());
            } else {
                info!("{}", status);
                println!("{}", serde_json::to_string_pretty(&config)?);
                println!("# {}", Config::get_path().display());
            }
        }
    }

    Ok(())
}

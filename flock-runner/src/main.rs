use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flock_runner::{find_route, parse_obstacle, parse_point, simulate, GridMap, SimulateOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless boid flocking and grid pathfinding", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a flock from a JSON config
    Simulate {
        /// Flock config file (JSON, missing fields take defaults)
        #[arg(short, long)]
        config: PathBuf,

        /// Number of ticks to run
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// Seconds per tick
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Override the config's random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Reload the config whenever the file changes
        #[arg(short, long)]
        watch: bool,

        /// Print every boid's transform as JSON lines on stdout
        #[arg(short, long)]
        emit: bool,

        /// Spherical obstacle as x,y,radius (repeatable)
        #[arg(short, long = "obstacle", value_parser = parse_obstacle)]
        obstacles: Vec<(f32, f32, f32)>,
    },
    /// Find a path across an ASCII map of '.' and '#'
    Path {
        /// Map file
        #[arg(short, long)]
        map: PathBuf,

        /// Start cell as x,y
        #[arg(short, long, value_parser = parse_point)]
        from: (usize, usize),

        /// Goal cell as x,y
        #[arg(short, long, value_parser = parse_point)]
        to: (usize, usize),

        /// Only move along rows and columns
        #[arg(long)]
        no_diagonal: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    match args.command {
        Command::Simulate {
            config,
            ticks,
            dt,
            seed,
            watch,
            emit,
            obstacles,
        } => {
            if !dt.is_finite() || dt < 0.0 {
                anyhow::bail!("--dt must be a non-negative number of seconds, got {}", dt);
            }
            let options = SimulateOptions {
                ticks,
                dt,
                seed,
                watch,
                emit,
                obstacles,
            };
            let status = simulate(&config, &options, io::stdout().lock())
                .context("Simulation failed")?;
            if !emit {
                println!("{}", serde_json::to_string(&status)?);
            }
        }
        Command::Path {
            map,
            from,
            to,
            no_diagonal,
        } => {
            let text = fs::read_to_string(&map)
                .with_context(|| format!("Failed to read map {}", map.display()))?;
            let grid: GridMap = text
                .parse()
                .with_context(|| format!("Failed to parse map {}", map.display()))?;

            match find_route(&grid, from, to, !no_diagonal)? {
                Some(route) => {
                    log::info!("Found path of {} steps", route.len());
                    print!("{}", grid.render(&route));
                }
                None => anyhow::bail!("No path from {},{} to {},{}", from.0, from.1, to.0, to.1),
            }
        }
    }

    Ok(())
}

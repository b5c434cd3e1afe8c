use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fdm_runner::cli::{cmd_run, cmd_waypoints, RunOptions};
use fdm_runner::config::Settings;

#[derive(Parser)]
#[command(name = "fdm-runner")]
#[command(about = "Drive a flight dynamics model in real time and build waypoint event files", long_about = None)]
struct Cli {
    /// Settings JSON with `run` and `waypoints` sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against an aircraft model
    Run {
        /// Engine root holding aircraft/ and scripts/
        #[arg(short, long, default_value = "data")]
        root: PathBuf,

        /// Aircraft model; defaults to the one named by the script
        #[arg(short, long)]
        model: Option<String>,

        /// Script path relative to the root
        #[arg(short, long, default_value = "scripts/787-8_bj_xian.json")]
        script: String,

        /// Initial conditions file relative to the root
        #[arg(long)]
        ic: Option<String>,

        /// Run as fast as possible instead of in real time
        #[arg(long)]
        batch: bool,

        /// Sleep between iterations
        #[arg(long)]
        nice: bool,

        /// Start on hold
        #[arg(long)]
        suspend: bool,

        /// Stop once sim time passes this many seconds
        #[arg(long)]
        end: Option<f64>,

        /// Sleep period in seconds for batch runs with --nice
        #[arg(long)]
        sleep_period: Option<f64>,

        /// Do not read pause/resume/step/quit commands from stdin
        #[arg(long)]
        no_stdin: bool,
    },

    /// Convert a waypoint table (CSV) into an events XML file
    Waypoints {
        input: PathBuf,

        #[arg(short, long, default_value = "waypoints.xml")]
        output: PathBuf,

        /// Waypoint capture distance in feet
        #[arg(short, long)]
        distance: Option<u32>,

        /// Also print the document to stdout
        #[arg(short, long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Run {
            root,
            model,
            script,
            ic,
            batch,
            nice,
            suspend,
            end,
            sleep_period,
            no_stdin,
        } => {
            let run = &mut settings.run;
            run.realtime &= !batch;
            run.nice |= nice;
            run.suspend |= suspend;
            if let Some(end) = end {
                run.end = end;
            }
            if let Some(period) = sleep_period {
                run.sleep_period = period;
            }

            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
                .context("Failed to install Ctrl-C handler")?;

            info!("Starting simulation from {:?}", root);
            let options = RunOptions {
                root,
                model,
                script,
                ic,
                read_stdin: !no_stdin,
            };
            let report = cmd_run(options, settings.run, settings.waypoints, shutdown).await?;
            info!("Simulation finished: {}", report);
        }

        Commands::Waypoints {
            input,
            output,
            distance,
            print,
        } => {
            if let Some(distance) = distance {
                settings.waypoints.wp_distance_ft = distance;
            }
            cmd_waypoints(&input, &output, &settings.waypoints, print)?;
        }
    }

    Ok(())
}

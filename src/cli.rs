use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::config::{RunConfig, WaypointConfig};
use crate::fdm::{FlightDynamics, KinematicFdm};
use crate::simulator::{Command, RealtimeRunner, RunReport, RunStatus};
use crate::waypoints;

/// What to load into the engine before running
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub model: Option<String>,
    pub script: String,
    pub ic: Option<String>,
    pub read_stdin: bool,
}

/// Convert a waypoint table to an events file
pub fn cmd_waypoints(input: &Path, output: &Path, config: &WaypointConfig, print: bool) -> Result<String> {
    let xml = waypoints::convert_table(input, config)
        .with_context(|| format!("Failed to convert waypoint table: {:?}", input))?;

    if print {
        println!("{}", xml);
    }

    std::fs::write(output, &xml)
        .with_context(|| format!("Failed to write events file: {:?}", output))?;
    info!("[WAYPOINTS] Wrote {:?}", output);

    Ok(xml)
}

/// Load model, initial conditions and script, then apply initial conditions
pub fn prepare_fdm(options: &RunOptions, waypoint_config: &WaypointConfig) -> Result<KinematicFdm> {
    let mut fdm = KinematicFdm::new(&options.root).with_waypoint_config(waypoint_config.clone());

    if let Some(ref model) = options.model {
        fdm.load_model(model)
            .with_context(|| format!("Failed to load model {}", model))?;
    }
    if let Some(ref ic) = options.ic {
        fdm.load_ic(ic)
            .with_context(|| format!("Failed to load initial conditions {}", ic))?;
    }
    fdm.load_script(&options.script)
        .with_context(|| format!("Failed to load script {}", options.script))?;

    fdm.run_ic().context("Failed to apply initial conditions")?;

    for line in fdm.configuration().lines() {
        info!("[FDM] {}", line);
    }

    Ok(fdm)
}

/// Forward operator commands typed on stdin
fn spawn_stdin_reader(tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("[RUNNER] {} (try pause, resume, step N, quit)", e),
            }
        }
    });
}

/// Wait for the simulation task and stop the status reporter whatever its outcome
async fn finish_run<T>(simulation: JoinHandle<T>, reporter: JoinHandle<()>) -> Result<T> {
    let outcome = simulation.await;
    reporter.abort();
    outcome.context("Simulation task panicked")
}

/// Run the engine in the pacing loop until it stops
pub async fn cmd_run(
    options: RunOptions,
    run_config: RunConfig,
    waypoint_config: WaypointConfig,
    shutdown: Arc<AtomicBool>,
) -> Result<RunReport> {
    run_config.validate()?;
    let fdm = prepare_fdm(&options, &waypoint_config)?;

    let (status_tx, mut status_rx) = watch::channel(RunStatus::default());
    let mut runner = RealtimeRunner::new(fdm, run_config.clone())
        .with_shutdown(shutdown)
        .with_status(status_tx);

    if options.read_stdin {
        let (tx, rx) = mpsc::channel();
        spawn_stdin_reader(tx);
        runner = runner.with_commands(rx);
    }

    let status_period = Duration::try_from_secs_f64(run_config.status_interval.max(0.1))
        .context("Invalid status interval")?;
    let reporter = tokio::spawn(async move {
        let mut ticker = interval(status_period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let status = *status_rx.borrow_and_update();
            info!(
                "[RUNNER] sim {:.2}s, wall {:.2}s, {} frames{}",
                status.sim_time,
                status.wall_time,
                status.frames,
                if status.holding { " (holding)" } else { "" }
            );
        }
    });

    let simulation = tokio::task::spawn_blocking(move || runner.run());
    let outcome = finish_run(simulation, reporter).await?;

    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn spawn_reporter() -> (JoinHandle<()>, oneshot::Receiver<()>) {
        let (guard, stopped) = oneshot::channel::<()>();
        let reporter = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        (reporter, stopped)
    }

    #[tokio::test]
    async fn test_reporter_stops_when_simulation_panics() {
        let (reporter, stopped) = spawn_reporter();
        let simulation = tokio::task::spawn_blocking(|| -> u32 { panic!("engine blew up") });

        assert!(finish_run(simulation, reporter).await.is_err());
        let dropped = tokio::time::timeout(Duration::from_secs(5), stopped).await;
        assert!(matches!(dropped, Ok(Err(_))));
    }

    #[tokio::test]
    async fn test_reporter_stops_after_normal_run() -> Result<()> {
        let (reporter, stopped) = spawn_reporter();
        let simulation = tokio::task::spawn_blocking(|| 7u32);

        assert_eq!(finish_run(simulation, reporter).await?, 7);
        let dropped = tokio::time::timeout(Duration::from_secs(5), stopped).await;
        assert!(matches!(dropped, Ok(Err(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_rejects_oversized_sleep_period() {
        let options = RunOptions {
            root: "data".into(),
            model: None,
            script: "scripts/787-8_bj_xian.json".to_string(),
            ic: None,
            read_stdin: false,
        };
        let config = RunConfig {
            sleep_period: 1e20,
            ..RunConfig::default()
        };

        let result = cmd_run(options, config, WaypointConfig::default(), Arc::new(AtomicBool::new(false))).await;
        assert!(result.is_err());
    }
}

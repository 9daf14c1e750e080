use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use lane_dodger::config::SimulationConfig;
use lane_dodger::game::clock::{SimulationClock, StopReason};
use lane_dodger::game::input_buffer::{CommandQueueError, CommandSender};
use lane_dodger::game::lanes::Board;
use lane_dodger::game::leaderboard::Leaderboard;
use lane_dodger::game::simulation::Simulation;
use lane_dodger::game::systems::autopilot::Autopilot;
use lane_dodger::metrics::{self, SimulationMetrics};
use lane_dodger::net::protocol::{Command, RenderSnapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Lane Dodger v{}", env!("CARGO_PKG_VERSION"));

    let config = SimulationConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {} lanes, {}x{} board, difficulty={}, seed={:?}",
        config.lane_count, config.board_width, config.board_height, config.difficulty, config.seed
    );

    let player_name = std::env::var("PLAYER_NAME").unwrap_or_default();
    let max_ticks: Option<u64> = std::env::var("MAX_TICKS").ok().and_then(|s| s.parse().ok());
    let leaderboard_path = std::env::var("LEADERBOARD_PATH").ok();
    let lookahead: Option<f32> = std::env::var("AUTOPILOT_LOOKAHEAD")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v: &f32| v.is_finite() && *v >= 0.0);

    let metrics = Arc::new(SimulationMetrics::new());
    if let Some(port) = std::env::var("METRICS_PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
        let metrics_clone = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics_clone, port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let tick_ms = config.tick_interval_ms;
    let board = Board::from_config(&config);
    let simulation = Simulation::new(config)?;

    let mut clock = SimulationClock::new(simulation).with_metrics(metrics.clone());
    if let Some(max) = max_ticks {
        clock = clock.with_max_ticks(max);
    }

    let mut autopilot = Autopilot::new(board);
    if let Some(lookahead) = lookahead {
        autopilot = autopilot.with_lookahead(lookahead);
    }

    let pilot = tokio::spawn(drive_autopilot(
        autopilot,
        clock.subscribe(),
        clock.command_sender(),
        tick_ms,
    ));

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let (reason, simulation) = clock.run(shutdown).await;
    if let Err(e) = pilot.await {
        warn!("Autopilot task failed: {}", e);
    }

    match reason {
        StopReason::GameOver { final_score } => info!(final_score, "Game over"),
        StopReason::TickLimit => info!(score = simulation.score(), "Tick limit reached"),
        StopReason::Shutdown => info!(score = simulation.score(), "Stopped before game over"),
    }

    if let Some(submission) = simulation.score_submission(&player_name) {
        info!("Score submission: {}", submission.to_json()?);

        if let Some(path) = leaderboard_path {
            let mut leaderboard = Leaderboard::load(&path)?;
            match leaderboard.submit(submission) {
                Some(rank) => info!(rank, "Made the leaderboard"),
                None => info!("Score did not make the leaderboard"),
            }
            leaderboard.save(&path)?;
            info!(entries = leaderboard.len(), top = ?leaderboard.top_score(), "Leaderboard saved");
            for entry in leaderboard.rankings() {
                info!("#{:<2} {:<16} {}", entry.rank, entry.name, entry.score);
            }
        }
    }

    info!("Metrics: {}", metrics.to_json());
    Ok(())
}

/// Feed autopilot decisions back into the command queue until the clock stops
async fn drive_autopilot(
    pilot: Autopilot,
    mut snapshots: watch::Receiver<RenderSnapshot>,
    sender: CommandSender,
    tick_ms: u64,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.is_game_over() {
            break;
        }
        let Some(kind) = pilot.decide(&snapshot) else {
            continue;
        };
        match sender.try_send(Command::new(kind, snapshot.tick * tick_ms)) {
            Ok(()) => {}
            Err(CommandQueueError::Full) => debug!("Command queue full, dropping autopilot command"),
            Err(CommandQueueError::Disconnected) => break,
        }
    }
}

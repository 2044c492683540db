//! Rampart - a tower-defense simulation on a small ECS
//!
//! Runs the simulation headless: a scripted driver plays the wave schedule and
//! the purchases from the settings file, and the outcome is logged.

mod headless;
mod settings;

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use parking_lot::Mutex;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use rampart_game::{GameStatus, Simulation};

use crate::headless::{HeadlessScene, ScriptedDriver};
use crate::settings::{ScriptedPlacement, Settings};

fn main() -> Result<()> {
    // Initialize logging. The level from the settings file is applied once it
    // is loaded, unless RUST_LOG is set.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .context("Failed to set subscriber")?;

    info!("Starting Rampart...");

    let settings = Settings::load();
    if !from_env {
        filter_handle
            .reload(EnvFilter::new(&settings.logging.level))
            .context("Failed to apply log level")?;
    }
    if std::env::args().any(|arg| arg == "--write-settings") {
        settings.save().context("Failed to save settings")?;
    }

    let scene = Arc::new(Mutex::new(HeadlessScene::default()));
    let driver = Arc::new(Mutex::new(ScriptedDriver::new(&settings)));
    let mut simulation = Simulation::new(&settings.simulation, scene.clone(), driver.clone())
        .context("Failed to build simulation")?;

    let mut placements: Vec<ScriptedPlacement> = settings.placements.clone();
    placements.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut placements = VecDeque::from(placements);

    let mut status = GameStatus::Running;
    for frame in 0..settings.run.frames {
        // One purchase per frame: the pointer only holds one cell.
        if placements
            .front()
            .is_some_and(|next| next.at <= simulation.elapsed())
        {
            if let Some(next) = placements.pop_front() {
                debug!("Queueing {:?} at {:?}", next.item, next.cell);
                simulation.set_pointer(Some(Vec3::new(next.cell[0], 0.0, next.cell[1])));
                simulation.request_placement(next.item, next.cost);
            }
        }

        status = simulation.frame(settings.run.frame_delta);
        if status != GameStatus::Running {
            break;
        }

        let every = settings.run.report_every;
        if every > 0 && frame % every == 0 {
            info!(
                "Frame {}: t={:.1}s, {} entities, power {:.0}",
                frame,
                simulation.elapsed(),
                simulation.world().entity_count(),
                driver.lock().power()
            );
        }
    }

    let driver = driver.lock();
    let scene = scene.lock();
    info!(
        "Finished after {} ticks ({:.1}s): {:?}{}",
        simulation.ticks(),
        simulation.elapsed(),
        status,
        driver
            .info()
            .map(|text| format!(" \"{}\"", text))
            .unwrap_or_default()
    );
    info!(
        "Power {:.0}, {} entities alive, {} of {} visuals shown, stopped: {}",
        driver.power(),
        simulation.world().entity_count(),
        scene.live(),
        scene.created(),
        driver.stopped()
    );
    Ok(())
}

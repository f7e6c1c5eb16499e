// Host Runner - Drives an engine from startup through a paced frame loop
// Stands in for a UI shell: logs progress, optionally selects an object,
// then renders the configured number of frames.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serde::Serialize;

use crate::app_core::AppController;
use crate::config::HostConfig;
use crate::engine::{Engine, SimulationContext};
use crate::error::HostError;
use crate::progress::{LoadObserver, ProgressReporter};
use crate::selection::SelectionInfo;

/// Target frame time, ~60 FPS.
pub const FRAME_TIME: Duration = Duration::from_millis(16);

/// Forwards load progress to the log.
pub struct LoggingObserver;

impl LoadObserver for LoggingObserver {
    fn on_progress(&self, status: &str) {
        info!("[load] {status}");
    }

    fn on_load_succeeded(&self) {
        info!("[load] simulation ready");
    }

    fn on_load_failed(&self) {
        error!("[load] simulation failed to load");
    }
}

/// What a finished run looked like.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub julian_date: f64,
    pub selection: Option<SelectionInfo>,
    pub last_status: String,
}

/// Run `engine` through the full startup sequence and frame loop.
pub fn run_host<E: Engine>(engine: E, config: &HostConfig) -> Result<RunSummary, HostError> {
    if let Some(dir) = &config.data_dir {
        AppController::<E>::chdir(dir)?;
    }
    if !AppController::<E>::init_gl() {
        return Err(HostError::GraphicsInit);
    }

    let reporter = Arc::new(ProgressReporter::new());
    reporter.register(Arc::new(LoggingObserver));
    let mut app = AppController::new(engine, reporter);
    app.initialize()?;

    if !app.start_renderer()? {
        return Err(HostError::RendererFailed);
    }
    let (width, height) = config.viewport;
    app.resize(width, height)?;

    let loaded = app.start_simulation(
        config.config_path.as_deref(),
        (!config.extra_dirs.is_empty()).then_some(config.extra_dirs.as_slice()),
    )?;
    if !loaded {
        return Err(HostError::SimulationFailed);
    }

    app.start(config.start_time)?;
    app.tick()?;

    let context = app.simulation_context()?;
    let selection = match &config.select {
        Some(name) => {
            let found = context.find_object(name);
            if found.is_empty() {
                warn!("no object named {name:?}");
                None
            } else {
                context.set_selection(&found);
                let info = found.info();
                match serde_json::to_string(&info) {
                    Ok(json) => info!("selected {json}"),
                    Err(err) => warn!("could not encode selection: {err}"),
                }
                Some(info)
            }
        }
        None => None,
    };

    for _ in 0..config.frames {
        let frame_start = Instant::now();
        app.draw()?;
        app.tick()?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            thread::sleep(FRAME_TIME - elapsed);
        }
    }

    let summary = RunSummary {
        frames: config.frames,
        julian_date: context.time(),
        selection,
        last_status: app.reporter().current_status(),
    };
    info!(
        "run finished: {} frames, JD {:.6}",
        summary.frames, summary.julian_date
    );
    Ok(summary)
}

// App Core - Lifecycle state machine between the host and the engine
// Sequences init -> renderer -> simulation -> running and relays load progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::engine::Engine;
use crate::error::{EngineError, LifecycleError};
use crate::progress::ProgressReporter;

// =============================================================================
// LIFECYCLE STATE
// =============================================================================

/// Where the controller is in its startup sequence.
///
/// Transitions only move forward. There is no way back: restarting means a
/// fresh [`AppController`] around a fresh engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LifecycleState {
    Uninitialized,
    EngineInitialized,
    RendererStarted,
    SimulationStarted,
    Running,
}

/// Fractional seconds since the UNIX epoch, keeping sub-second precision.
pub fn epoch_seconds(at: &DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1e9
}

// =============================================================================
// APP CONTROLLER
// =============================================================================

/// Owns one engine instance and drives it through its lifecycle.
///
/// Lifecycle calls report engine failures as `Ok(false)` and leave the state
/// unchanged. Calling an operation in a state where it is not valid is a
/// programming error and fails immediately with
/// [`LifecycleError::InvalidState`]; nothing is forwarded to the engine.
pub struct AppController<E: Engine> {
    engine: E,
    state: LifecycleState,
    reporter: Arc<ProgressReporter>,
    simulation: Option<Arc<E::Context>>,
}

impl<E: Engine> AppController<E> {
    pub fn new(engine: E, reporter: Arc<ProgressReporter>) -> Self {
        Self {
            engine,
            state: LifecycleState::Uninitialized,
            reporter,
            simulation: None,
        }
    }

    // -------------------------------------------------------------------------
    // Process-global engine operations
    // -------------------------------------------------------------------------

    /// Prepare the graphics binding. Call before any `start_renderer`.
    pub fn init_gl() -> bool {
        let ready = E::init_gl();
        if !ready {
            error!("graphics binding could not be prepared");
        }
        ready
    }

    /// Set the directory relative resource paths resolve against.
    /// Call before `initialize` so every lookup sees the same root.
    pub fn chdir(path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        debug!("engine resource root -> {}", path.display());
        E::chdir(path)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state >= LifecycleState::EngineInitialized
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn reporter(&self) -> &Arc<ProgressReporter> {
        &self.reporter
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Allocate the engine. A second call on an initialized controller does
    /// nothing.
    pub fn initialize(&mut self) -> Result<(), LifecycleError> {
        if self.is_initialized() {
            debug!("initialize: already initialized ({:?})", self.state);
            return Ok(());
        }
        if let Err(err) = self.engine.init() {
            error!("engine initialization failed: {err}");
            return Err(LifecycleError::Initialization(err));
        }
        self.advance(LifecycleState::EngineInitialized);
        Ok(())
    }

    pub fn start_renderer(&mut self) -> Result<bool, LifecycleError> {
        self.require("start_renderer", &[LifecycleState::EngineInitialized])?;
        if !self.engine.start_renderer() {
            warn!("renderer failed to start");
            return Ok(false);
        }
        self.advance(LifecycleState::RendererStarted);
        Ok(true)
    }

    /// Load the simulation, forwarding every engine progress line to the
    /// reporter and finishing with exactly one success or failure
    /// notification. On failure the controller stays in `RendererStarted`
    /// and the call may be retried.
    ///
    /// Blocks until the engine finishes loading, also when called from
    /// inside an async runtime. Async hosts that must stay responsive should
    /// call it from `spawn_blocking`.
    pub fn start_simulation(
        &mut self,
        config_path: Option<&Path>,
        extra_data_dirs: Option<&[PathBuf]>,
    ) -> Result<bool, LifecycleError> {
        self.require("start_simulation", &[LifecycleState::RendererStarted])?;

        let reporter = Arc::clone(&self.reporter);
        let loaded = self
            .engine
            .start_simulation(config_path, extra_data_dirs, &mut |status| {
                reporter.report_progress(status)
            });
        reporter.report_load_result(loaded);

        if !loaded {
            warn!("simulation failed to load");
            return Ok(false);
        }
        self.advance(LifecycleState::SimulationStarted);
        Ok(true)
    }

    /// Start the clock, at `at_time` or at the engine's "now".
    ///
    /// Valid exactly once; calling it again after the controller is running
    /// is rejected like any other out-of-order call.
    pub fn start(&mut self, at_time: Option<DateTime<Utc>>) -> Result<(), LifecycleError> {
        self.require("start", &[LifecycleState::SimulationStarted])?;
        let seconds = at_time.as_ref().map(epoch_seconds);
        self.engine.start(seconds);
        self.advance(LifecycleState::Running);
        Ok(())
    }

    pub fn tick(&mut self) -> Result<(), LifecycleError> {
        self.require("tick", &[LifecycleState::Running])?;
        self.engine.tick();
        Ok(())
    }

    pub fn draw(&mut self) -> Result<(), LifecycleError> {
        self.require("draw", &[LifecycleState::Running])?;
        self.engine.draw();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), LifecycleError> {
        self.require(
            "resize",
            &[
                LifecycleState::RendererStarted,
                LifecycleState::SimulationStarted,
                LifecycleState::Running,
            ],
        )?;
        self.engine.resize(width, height);
        Ok(())
    }

    /// Handle to the loaded simulation, fetched from the engine on first use
    /// and cached for the life of the controller.
    pub fn simulation_context(&mut self) -> Result<Arc<E::Context>, LifecycleError> {
        self.require(
            "simulation_context",
            &[LifecycleState::SimulationStarted, LifecycleState::Running],
        )?;
        if let Some(context) = &self.simulation {
            return Ok(Arc::clone(context));
        }
        let context = self.engine.simulation_context();
        self.simulation = Some(Arc::clone(&context));
        Ok(context)
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[LifecycleState],
    ) -> Result<(), LifecycleError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        error!("`{operation}` called in state {:?}", self.state);
        Err(LifecycleError::InvalidState {
            operation,
            state: self.state,
        })
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(next > self.state, "lifecycle must only move forward");
        info!("lifecycle: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

// =============================================================================
// TESTS
// =============================================================================

// Engine API - The boundary between the binding layer and the simulation engine
// Everything behind these traits (catalogs, physics, rendering) belongs to the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::EngineError;
use crate::selection::Selection;

/// Julian date of the UNIX epoch (1970-01-01 00:00 UTC).
pub const UNIX_EPOCH_JULIAN_DATE: f64 = 2440587.5;

/// Julian date of the J2000 epoch (2000-01-01 12:00 TT).
pub const J2000_JULIAN_DATE: f64 = 2451545.0;

pub const SECONDS_PER_DAY: f64 = 86400.0;

/// Convert seconds since the UNIX epoch to a Julian date.
pub fn julian_date_from_epoch_seconds(seconds: f64) -> f64 {
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JULIAN_DATE
}

// =============================================================================
// ENGINE
// =============================================================================

/// Lifecycle surface of a simulation engine.
///
/// The [`AppController`](crate::app_core::AppController) is the only caller
/// and guarantees the call order: `init`, `start_renderer`,
/// `start_simulation`, `start`, then any number of `tick` / `draw`.
/// `resize` may arrive any time after the renderer is up.
pub trait Engine {
    /// Handle type returned by [`simulation_context`](Self::simulation_context).
    type Context: SimulationContext + 'static;

    /// Allocate and configure the engine's resources.
    fn init(&mut self) -> Result<(), EngineError>;

    /// Bring up the renderer. `false` when the graphics context is unusable.
    fn start_renderer(&mut self) -> bool;

    /// Load the simulation. May block for a long time.
    ///
    /// `on_progress` must only be invoked on the calling thread; engines
    /// that load on worker threads marshal events back first (see
    /// [`ProgressRelay`](crate::progress::ProgressRelay)).
    ///
    /// Callers may be on a thread driving an async runtime. Implementations
    /// must not use blocking calls that panic there; the runtime's other
    /// tasks stall until the load returns.
    fn start_simulation(
        &mut self,
        config_path: Option<&Path>,
        extra_data_dirs: Option<&[PathBuf]>,
        on_progress: &mut dyn FnMut(&str),
    ) -> bool;

    /// Start the clock at `epoch_seconds` (seconds since the UNIX epoch),
    /// or at the engine's notion of "now" when `None`.
    fn start(&mut self, epoch_seconds: Option<f64>);

    fn tick(&mut self);

    fn draw(&mut self);

    fn resize(&mut self, width: u32, height: u32);

    /// Handle to the running simulation. Only valid after a successful
    /// `start_simulation`.
    fn simulation_context(&mut self) -> Arc<Self::Context>;

    /// Prepare the process-wide graphics binding.
    fn init_gl() -> bool;

    /// Set the process-wide directory relative resource paths resolve against.
    fn chdir(path: &Path) -> Result<(), EngineError>;
}

// =============================================================================
// SIMULATION CONTEXT
// =============================================================================

/// Queries and commands on a running simulation.
///
/// Shared between the controller and client code, hence `&self` everywhere.
pub trait SimulationContext: Send + Sync {
    fn selection(&self) -> Selection;

    fn set_selection(&self, selection: &Selection);

    /// Look an object up by name. [`Selection::None`] when nothing matches.
    fn find_object(&self, name: &str) -> Selection;

    /// Object names starting with `prefix` (case-insensitive), at most `limit`.
    fn completion_for_text(&self, prefix: &str, limit: usize) -> Vec<String>;

    /// Current simulation time as a Julian date.
    fn time(&self) -> f64;

    fn set_time(&self, julian_date: f64);

    fn reverse_observer_orientation(&self);
}

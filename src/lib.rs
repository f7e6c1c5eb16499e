// Orrery - Lifecycle, selection and progress layer for an embedded sky simulation
// Library entry point and headless host runner

pub mod app_core;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod host;
pub mod progress;
pub mod sandbox_engine;
pub mod selection;

#[cfg(test)]
mod testing;

pub use app_core::{AppController, LifecycleState};
pub use config::HostConfig;
pub use engine::{Engine, SimulationContext};
pub use entity::{AstroObject, Body, DeepSkyObject, EntityHandle, EntityKind, Location, Star};
pub use error::{ConfigError, EngineError, HostError, LifecycleError};
pub use host::{run_host, LoggingObserver, RunSummary};
pub use progress::{LoadObserver, ProgressRelay, ProgressReporter, RelaySender};
pub use sandbox_engine::SandboxEngine;
pub use selection::{GenericMatch, Selection, SelectionInfo, SelectionKind};

/// Run the sandbox engine with settings from the environment.
pub fn run() -> Result<RunSummary, HostError> {
    // A second `run` in the same process keeps the first logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = HostConfig::from_env()?;
    log::info!("orrery starting: {config:?}");
    run_host(SandboxEngine::new(), &config)
}

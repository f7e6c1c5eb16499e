// Error Types - Failures surfaced by the engine, the controller and the host
// Each error carries a stable code and tells the host whether a retry can help

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::app_core::LifecycleState;

// =============================================================================
// ENGINE ERRORS
// =============================================================================

/// Failure reported by an [`Engine`](crate::engine::Engine) implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not allocate the resources it needs to exist.
    #[error("engine allocation failed: {0}")]
    AllocationFailed(String),

    /// No usable graphics binding; `init_gl` was not called or failed.
    #[error("graphics binding is not available")]
    GraphicsUnavailable,

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A catalog or config file could not be parsed.
    #[error("malformed data file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A background loader thread died before reporting a result.
    #[error("loader thread panicked")]
    LoaderPanicked,
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed(_) => "ENGINE_ALLOCATION_FAILED",
            Self::GraphicsUnavailable => "ENGINE_GRAPHICS_UNAVAILABLE",
            Self::Io { .. } => "ENGINE_IO",
            Self::Malformed { .. } => "ENGINE_MALFORMED_DATA",
            Self::LoaderPanicked => "ENGINE_LOADER_PANICKED",
        }
    }

    /// Data and graphics problems can be fixed by the host and retried;
    /// allocation failure and a dead loader cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::GraphicsUnavailable | Self::Io { .. } | Self::Malformed { .. }
        )
    }
}

// =============================================================================
// LIFECYCLE ERRORS
// =============================================================================

/// Error returned by [`AppController`](crate::app_core::AppController).
///
/// | Variant | Meaning | Recoverable |
/// |---------|---------|-------------|
/// | [`InvalidState`](Self::InvalidState) | operation called in the wrong lifecycle state | No |
/// | [`Initialization`](Self::Initialization) | engine could not be initialized | No |
///
/// Engine failures during `start_renderer` / `start_simulation` are not
/// errors: those calls report them as `Ok(false)`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Programming error: the call is not valid in the current state.
    #[error("`{operation}` is not valid in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("engine initialization failed: {0}")]
    Initialization(#[from] EngineError),
}

impl LifecycleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "LIFECYCLE_INVALID_STATE",
            Self::Initialization(_) => "LIFECYCLE_INITIALIZATION",
        }
    }

    /// Always `false`: misuse is a defect and a failed engine init is fatal.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

// =============================================================================
// HOST ERRORS
// =============================================================================

/// Invalid host configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: invalid timestamp {value:?} (expected RFC 3339): {source}")]
    InvalidTimestamp {
        key: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{key}: invalid viewport {value:?} (expected WIDTHxHEIGHT)")]
    InvalidViewport { key: &'static str, value: String },

    #[error("{key}: invalid number {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Everything that can stop the host runner.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("graphics binding could not be prepared")]
    GraphicsInit,

    #[error("renderer failed to start")]
    RendererFailed,

    #[error("simulation failed to load")]
    SimulationFailed,
}

impl HostError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "HOST_CONFIG",
            Self::Engine(err) => err.code(),
            Self::Lifecycle(err) => err.code(),
            Self::GraphicsInit => "HOST_GRAPHICS_INIT",
            Self::RendererFailed => "HOST_RENDERER_FAILED",
            Self::SimulationFailed => "HOST_SIMULATION_FAILED",
        }
    }
}

// Sandbox Engine - Headless in-process implementation of the engine API
// Loads a JSON object catalog on a worker thread and keeps simulation time
// as a Julian date. Nothing is rendered; frames are only counted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::app_core::epoch_seconds;
use crate::catalog::{read_json, Catalog};
use crate::engine::{
    julian_date_from_epoch_seconds, Engine, SimulationContext, J2000_JULIAN_DATE,
    SECONDS_PER_DAY,
};
use crate::entity::EntityHandle;
use crate::error::EngineError;
use crate::progress::{ProgressRelay, RelaySender};
use crate::selection::Selection;

/// Simulated seconds per wall-clock second.
pub const DEFAULT_TIME_SCALE: f64 = 1.0;
pub const MAX_TIME_SCALE: f64 = 1_000_000.0;

// =============================================================================
// PROCESS-GLOBAL STATE
// =============================================================================

static GL_READY: AtomicBool = AtomicBool::new(false);
static RESOURCE_ROOT: RwLock<Option<PathBuf>> = parking_lot::const_rwlock(None);

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve_resource(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// CONFIG FILE
// =============================================================================

/// Top-level sandbox config: which catalogs to load and how fast time runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

fn default_time_scale() -> f64 {
    DEFAULT_TIME_SCALE
}

struct Loaded {
    catalog: Catalog,
    time_scale: f64,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Every `*.json` file directly inside `dir`, sorted. An unreadable
/// directory or entry fails the whole listing.
fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let io_error = |source: std::io::Error| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Runs on the loader thread. Every file is announced before it is read.
fn load_simulation(
    root: Option<PathBuf>,
    config_path: Option<PathBuf>,
    extra_dirs: Vec<PathBuf>,
    progress: &RelaySender,
) -> Result<Loaded, EngineError> {
    let root = root.as_deref();
    let mut loaded = match config_path {
        Some(config_path) => {
            let config_path = resolve_resource(root, &config_path);
            progress.send(format!("Loading {}", file_label(&config_path)));
            let config: SandboxConfig = read_json(&config_path)?;

            let mut catalog = Catalog::new();
            for catalog_path in &config.catalogs {
                let catalog_path = resolve_resource(root, catalog_path);
                progress.send(format!("Loading {}", file_label(&catalog_path)));
                catalog.merge(read_json(&catalog_path)?);
            }
            Loaded {
                catalog,
                time_scale: config.time_scale.clamp(-MAX_TIME_SCALE, MAX_TIME_SCALE),
            }
        }
        None => {
            progress.send("Loading built-in catalog");
            Loaded {
                catalog: Catalog::builtin(),
                time_scale: DEFAULT_TIME_SCALE,
            }
        }
    };

    for dir in extra_dirs {
        for file in json_files_in(&resolve_resource(root, &dir))? {
            progress.send(format!("Loading {}", file_label(&file)));
            loaded.catalog.merge(read_json(&file)?);
        }
    }

    Ok(loaded)
}

// =============================================================================
// SIMULATION CONTEXT
// =============================================================================

struct SimState {
    catalog: Option<Arc<Catalog>>,
    selection: Selection,
    julian_date: f64,
    time_scale: f64,
    is_paused: bool,
    orientation_reversed: bool,
}

/// Shared handle to the sandbox's running simulation.
pub struct SandboxSimulation {
    state: RwLock<SimState>,
}

impl SandboxSimulation {
    fn new() -> Self {
        Self {
            state: RwLock::new(SimState {
                catalog: None,
                selection: Selection::None,
                julian_date: J2000_JULIAN_DATE,
                time_scale: DEFAULT_TIME_SCALE,
                is_paused: true,
                orientation_reversed: false,
            }),
        }
    }

    pub fn time_scale(&self) -> f64 {
        self.state.read().time_scale
    }

    pub fn set_time_scale(&self, scale: f64) {
        self.state.write().time_scale = scale.clamp(-MAX_TIME_SCALE, MAX_TIME_SCALE);
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().is_paused
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.write().is_paused = paused;
    }

    pub fn is_orientation_reversed(&self) -> bool {
        self.state.read().orientation_reversed
    }

    pub fn object_count(&self) -> usize {
        self.state.read().catalog.as_ref().map_or(0, |c| c.len())
    }

    fn install(&self, loaded: Loaded) {
        let mut state = self.state.write();
        // Handles into the previous catalog go stale here.
        state.catalog = Some(Arc::new(loaded.catalog));
        state.selection = Selection::None;
        state.time_scale = loaded.time_scale;
    }

    fn advance(&self, wall_seconds: f64) {
        let mut state = self.state.write();
        if !state.is_paused {
            state.julian_date += wall_seconds * state.time_scale / SECONDS_PER_DAY;
        }
    }

    fn start_clock(&self, julian_date: f64) {
        let mut state = self.state.write();
        state.julian_date = julian_date;
        state.is_paused = false;
    }
}

impl SimulationContext for SandboxSimulation {
    fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    fn set_selection(&self, selection: &Selection) {
        self.state.write().selection = selection.clone();
    }

    fn find_object(&self, name: &str) -> Selection {
        let state = self.state.read();
        let Some(catalog) = &state.catalog else {
            return Selection::None;
        };
        match catalog.find(name) {
            Some(object) => {
                let weak: Weak<Catalog> = Arc::downgrade(catalog);
                Selection::from_handle(EntityHandle::new(object.id, weak))
            }
            None => Selection::None,
        }
    }

    fn completion_for_text(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.state
            .read()
            .catalog
            .as_ref()
            .map(|catalog| catalog.completions(prefix, limit))
            .unwrap_or_default()
    }

    fn time(&self) -> f64 {
        self.state.read().julian_date
    }

    fn set_time(&self, julian_date: f64) {
        self.state.write().julian_date = julian_date;
    }

    fn reverse_observer_orientation(&self) {
        let mut state = self.state.write();
        state.orientation_reversed = !state.orientation_reversed;
    }
}

// =============================================================================
// SANDBOX ENGINE
// =============================================================================

pub struct SandboxEngine {
    simulation: Arc<SandboxSimulation>,
    initialized: bool,
    renderer_ready: bool,
    viewport: (u32, u32),
    frames_drawn: u64,
    last_tick: Option<Instant>,
}

impl SandboxEngine {
    pub fn new() -> Self {
        Self {
            simulation: Arc::new(SandboxSimulation::new()),
            initialized: false,
            renderer_ready: false,
            viewport: (0, 0),
            frames_drawn: 0,
            last_tick: None,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn resource_root() -> Option<PathBuf> {
        RESOURCE_ROOT.read().clone()
    }

    fn bring_up_renderer(&mut self, gl_ready: bool) -> bool {
        self.renderer_ready = self.initialized && gl_ready;
        if !self.renderer_ready {
            warn!("sandbox renderer: {}", EngineError::GraphicsUnavailable);
        }
        self.renderer_ready
    }
}

impl Default for SandboxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for SandboxEngine {
    type Context = SandboxSimulation;

    fn init(&mut self) -> Result<(), EngineError> {
        self.initialized = true;
        debug!("sandbox engine initialized");
        Ok(())
    }

    fn start_renderer(&mut self) -> bool {
        self.bring_up_renderer(GL_READY.load(Ordering::SeqCst))
    }

    fn start_simulation(
        &mut self,
        config_path: Option<&Path>,
        extra_data_dirs: Option<&[PathBuf]>,
        on_progress: &mut dyn FnMut(&str),
    ) -> bool {
        let root = Self::resource_root();
        let config_path = config_path.map(Path::to_path_buf);
        let extra_dirs = extra_data_dirs.map(<[PathBuf]>::to_vec).unwrap_or_default();

        let (sender, mut relay) = ProgressRelay::channel();
        let loader = thread::spawn(move || load_simulation(root, config_path, extra_dirs, &sender));
        relay.forward_until_closed(on_progress);

        let result = loader.join().unwrap_or(Err(EngineError::LoaderPanicked));
        match result {
            Ok(loaded) => {
                info!("sandbox catalog loaded: {} objects", loaded.catalog.len());
                self.simulation.install(loaded);
                true
            }
            Err(err) => {
                error!("sandbox load failed [{}]: {err}", err.code());
                false
            }
        }
    }

    fn start(&mut self, epoch_seconds_opt: Option<f64>) {
        let seconds = epoch_seconds_opt.unwrap_or_else(|| epoch_seconds(&Utc::now()));
        let julian_date = julian_date_from_epoch_seconds(seconds);
        self.simulation.start_clock(julian_date);
        self.last_tick = Some(Instant::now());
        info!("sandbox clock started at JD {julian_date:.6}");
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick.replace(now) {
            self.simulation.advance(now.duration_since(last).as_secs_f64());
        }
    }

    fn draw(&mut self) {
        self.frames_drawn += 1;
        trace!("sandbox frame {}", self.frames_drawn);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.viewport != (width, height) {
            debug!("sandbox viewport {width}x{height}");
            self.viewport = (width, height);
        }
    }

    fn simulation_context(&mut self) -> Arc<Self::Context> {
        Arc::clone(&self.simulation)
    }

    fn init_gl() -> bool {
        GL_READY.store(true, Ordering::SeqCst);
        true
    }

    fn chdir(path: &Path) -> Result<(), EngineError> {
        if !path.is_dir() {
            return Err(EngineError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }
        *RESOURCE_ROOT.write() = Some(path.to_path_buf());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

// Test Fixtures - Catalog, observer and engine doubles shared by unit tests

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::engine::{Engine, SimulationContext, J2000_JULIAN_DATE};
use crate::entity::{AstroObject, EntityCatalog, EntityHandle, EntityId, EntityKind};
use crate::error::EngineError;
use crate::progress::LoadObserver;
use crate::selection::Selection;

// =============================================================================
// FIXTURE CATALOG
// =============================================================================

struct FixtureEntry {
    id: EntityId,
    kind: EntityKind,
    name: &'static str,
    url: Option<&'static str>,
}

struct FixtureData {
    entries: Vec<FixtureEntry>,
}

impl FixtureData {
    fn entry(&self, id: EntityId) -> Option<&FixtureEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

impl EntityCatalog for FixtureData {
    fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entry(id).map(|e| e.kind)
    }

    fn name(&self, id: EntityId) -> Option<String> {
        self.entry(id).map(|e| e.name.to_owned())
    }

    fn web_info_url(&self, id: EntityId) -> Option<String> {
        self.entry(id)?.url.map(str::to_owned)
    }
}

/// Small fixed catalog. Dropping it simulates an engine reset.
pub(crate) struct FixtureCatalog {
    inner: Arc<FixtureData>,
}

impl FixtureCatalog {
    pub fn standard() -> Self {
        let entries = vec![
            FixtureEntry {
                id: EntityId(1),
                kind: EntityKind::Star,
                name: "Sirius",
                url: Some("https://example.org/sirius"),
            },
            FixtureEntry {
                id: EntityId(2),
                kind: EntityKind::Body,
                name: "Earth",
                url: Some("https://example.org/earth"),
            },
            FixtureEntry {
                id: EntityId(3),
                kind: EntityKind::DeepSky,
                name: "M31",
                url: Some("https://example.org/m31"),
            },
            FixtureEntry {
                id: EntityId(4),
                kind: EntityKind::Location,
                name: "Olympus Mons",
                url: Some("https://example.org/olympus-mons"),
            },
            FixtureEntry {
                id: EntityId(5),
                kind: EntityKind::Generic,
                name: "Marker",
                url: None,
            },
        ];
        Self {
            inner: Arc::new(FixtureData { entries }),
        }
    }

    pub fn id(&self, name: &str) -> EntityId {
        self.inner
            .entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.id)
            .unwrap_or_else(|| panic!("no fixture entry named {name}"))
    }

    pub fn weak(&self) -> Weak<dyn EntityCatalog> {
        let weak: Weak<FixtureData> = Arc::downgrade(&self.inner);
        weak
    }

    pub fn catalog(&self) -> Arc<dyn EntityCatalog> {
        self.inner.clone()
    }

    pub fn handle(&self, name: &str) -> EntityHandle {
        EntityHandle::new(self.id(name), self.weak())
    }

    pub fn object(&self, name: &str) -> AstroObject {
        AstroObject::classify(self.handle(name))
            .unwrap_or_else(|| panic!("{name} is not a concrete object"))
    }
}

// =============================================================================
// RECORDING OBSERVER
// =============================================================================

#[derive(Default)]
pub(crate) struct RecordingObserver {
    tag: Option<&'static str>,
    shared_log: Option<Arc<Mutex<Vec<String>>>>,
    progress: Mutex<Vec<String>>,
    successes: AtomicUsize,
    failures: AtomicUsize,
}

impl RecordingObserver {
    /// Also appends `"<tag>:<event>"` to a log shared between observers.
    pub fn tagged(tag: &'static str, shared_log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            tag: Some(tag),
            shared_log: Some(shared_log),
            ..Self::default()
        }
    }

    pub fn progress(&self) -> Vec<String> {
        self.progress.lock().clone()
    }

    pub fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn log(&self, event: &str) {
        if let (Some(tag), Some(log)) = (self.tag, &self.shared_log) {
            log.lock().push(format!("{tag}:{event}"));
        }
    }
}

impl LoadObserver for RecordingObserver {
    fn on_progress(&self, status: &str) {
        self.progress.lock().push(status.to_owned());
        self.log(status);
    }

    fn on_load_succeeded(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        self.log("succeeded");
    }

    fn on_load_failed(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.log("failed");
    }
}

// =============================================================================
// SCRIPTED ENGINE
// =============================================================================

static SCRIPTED_GL_READY: AtomicBool = AtomicBool::new(false);
static SCRIPTED_ROOT: Mutex<Option<PathBuf>> = parking_lot::const_mutex(None);

#[derive(Debug, Default)]
pub(crate) struct ScriptedContext {
    selection: RwLock<Selection>,
    julian_date: RwLock<f64>,
    reversed: AtomicBool,
}

impl SimulationContext for ScriptedContext {
    fn selection(&self) -> Selection {
        self.selection.read().clone()
    }

    fn set_selection(&self, selection: &Selection) {
        *self.selection.write() = selection.clone();
    }

    fn find_object(&self, _name: &str) -> Selection {
        Selection::None
    }

    fn completion_for_text(&self, _prefix: &str, _limit: usize) -> Vec<String> {
        Vec::new()
    }

    fn time(&self) -> f64 {
        *self.julian_date.read()
    }

    fn set_time(&self, julian_date: f64) {
        *self.julian_date.write() = julian_date;
    }

    fn reverse_observer_orientation(&self) {
        self.reversed.fetch_xor(true, Ordering::SeqCst);
    }
}

/// Engine double whose outcomes are scripted up front and whose calls are
/// recorded in order.
pub(crate) struct ScriptedEngine {
    init_error: Option<String>,
    renderer_ok: bool,
    simulation_outcomes: VecDeque<bool>,
    progress_events: Vec<String>,
    pub calls: Vec<String>,
    pub started_with: Option<Option<f64>>,
    pub context_fetches: usize,
    pub last_config: Option<PathBuf>,
    pub last_extra_dirs: Option<Vec<PathBuf>>,
    context: Arc<ScriptedContext>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            init_error: None,
            renderer_ok: true,
            simulation_outcomes: VecDeque::new(),
            progress_events: Vec::new(),
            calls: Vec::new(),
            started_with: None,
            context_fetches: 0,
            last_config: None,
            last_extra_dirs: None,
            context: Arc::new(ScriptedContext::default()),
        }
    }

    pub fn with_progress(mut self, events: &[&str]) -> Self {
        self.progress_events = events.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    pub fn failing_init(mut self, reason: &str) -> Self {
        self.init_error = Some(reason.to_owned());
        self
    }

    pub fn failing_renderer(mut self) -> Self {
        self.renderer_ok = false;
        self
    }

    /// Outcomes of successive `start_simulation` calls; `true` once exhausted.
    pub fn with_simulation_outcomes(mut self, outcomes: &[bool]) -> Self {
        self.simulation_outcomes = outcomes.iter().copied().collect();
        self
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn gl_ready() -> bool {
        SCRIPTED_GL_READY.load(Ordering::SeqCst)
    }

    pub fn resource_root() -> Option<PathBuf> {
        SCRIPTED_ROOT.lock().clone()
    }
}

impl Engine for ScriptedEngine {
    type Context = ScriptedContext;

    fn init(&mut self) -> Result<(), EngineError> {
        self.calls.push("init".into());
        match &self.init_error {
            Some(reason) => Err(EngineError::AllocationFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn start_renderer(&mut self) -> bool {
        self.calls.push("start_renderer".into());
        self.renderer_ok
    }

    fn start_simulation(
        &mut self,
        config_path: Option<&Path>,
        extra_data_dirs: Option<&[PathBuf]>,
        on_progress: &mut dyn FnMut(&str),
    ) -> bool {
        self.calls.push("start_simulation".into());
        self.last_config = config_path.map(Path::to_path_buf);
        self.last_extra_dirs = extra_data_dirs.map(<[PathBuf]>::to_vec);
        for event in &self.progress_events {
            on_progress(event);
        }
        self.simulation_outcomes.pop_front().unwrap_or(true)
    }

    fn start(&mut self, epoch_seconds: Option<f64>) {
        self.calls.push("start".into());
        self.started_with = Some(epoch_seconds);
        self.context.set_time(
            epoch_seconds
                .map(crate::engine::julian_date_from_epoch_seconds)
                .unwrap_or(J2000_JULIAN_DATE),
        );
    }

    fn tick(&mut self) {
        self.calls.push("tick".into());
    }

    fn draw(&mut self) {
        self.calls.push("draw".into());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(format!("resize({width}x{height})"));
    }

    fn simulation_context(&mut self) -> Arc<Self::Context> {
        self.context_fetches += 1;
        self.context.clone()
    }

    fn init_gl() -> bool {
        SCRIPTED_GL_READY.store(true, Ordering::SeqCst);
        true
    }

    fn chdir(path: &Path) -> Result<(), EngineError> {
        *SCRIPTED_ROOT.lock() = Some(path.to_path_buf());
        Ok(())
    }
}

// Entity Handles - Non-owning references to objects living inside the engine
// Stars, bodies, deep-sky objects and locations are owned by the engine catalog;
// the binding layer only ever holds weak references to them.

use serde::{Deserialize, Serialize};
use std::sync::{OnceLock, Weak};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque engine-side identifier of one catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Concrete kind of an engine object, as reported by its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Star,
    Body,
    DeepSky,
    Location,
    /// Engine-classified match with no typed object behind it (marker,
    /// coordinate or textual match). Never re-typed to one of the above.
    Generic,
}

// =============================================================================
// CATALOG INTERFACE
// =============================================================================

/// Read-only view of the engine's object catalog.
///
/// Implemented by engines; queried lazily by [`EntityHandle`]. All methods
/// return `None` for ids the catalog does not know.
pub trait EntityCatalog: Send + Sync {
    fn kind(&self, id: EntityId) -> Option<EntityKind>;
    fn name(&self, id: EntityId) -> Option<String>;
    fn web_info_url(&self, id: EntityId) -> Option<String>;
}

// =============================================================================
// ENTITY HANDLE
// =============================================================================

/// Non-owning reference to one engine-resident object.
///
/// The handle holds a weak link to the catalog that owns the object, so it
/// never keeps engine data alive. Name and web-info URL are fetched on first
/// use and cached; once the catalog is gone (engine reset) anything not yet
/// cached reads as absent.
#[derive(Debug, Clone)]
pub struct EntityHandle {
    id: EntityId,
    catalog: Weak<dyn EntityCatalog>,
    name: OnceLock<String>,
    web_info_url: OnceLock<Option<String>>,
}

impl EntityHandle {
    pub fn new(id: EntityId, catalog: Weak<dyn EntityCatalog>) -> Self {
        Self {
            id,
            catalog,
            name: OnceLock::new(),
            web_info_url: OnceLock::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the owning catalog still exists.
    pub fn is_alive(&self) -> bool {
        self.catalog.strong_count() > 0
    }

    /// Kind as reported by the catalog right now.
    pub fn kind(&self) -> Option<EntityKind> {
        self.catalog.upgrade()?.kind(self.id)
    }

    pub fn name(&self) -> Option<&str> {
        if let Some(name) = self.name.get() {
            return Some(name);
        }
        let name = self.catalog.upgrade()?.name(self.id)?;
        Some(self.name.get_or_init(|| name))
    }

    // Only kinds with an info page expose this publicly.
    fn web_info_url(&self) -> Option<&str> {
        if let Some(url) = self.web_info_url.get() {
            return url.as_deref();
        }
        let url = self.catalog.upgrade()?.web_info_url(self.id);
        self.web_info_url.get_or_init(|| url).as_deref()
    }
}

/// Two handles are equal when they reference the same id in the same catalog.
impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.catalog.as_ptr().cast::<()>() == other.catalog.as_ptr().cast::<()>()
    }
}

impl Eq for EntityHandle {}

// =============================================================================
// TYPED HANDLES
// =============================================================================

/// A star.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Star(EntityHandle);

impl Star {
    pub fn handle(&self) -> &EntityHandle {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }

    pub fn web_info_url(&self) -> Option<&str> {
        self.0.web_info_url()
    }
}

/// A solar-system body: planet, moon, asteroid, comet, spacecraft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body(EntityHandle);

impl Body {
    pub fn handle(&self) -> &EntityHandle {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }

    pub fn web_info_url(&self) -> Option<&str> {
        self.0.web_info_url()
    }
}

/// A galaxy, nebula or cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepSkyObject(EntityHandle);

impl DeepSkyObject {
    pub fn handle(&self) -> &EntityHandle {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }

    pub fn web_info_url(&self) -> Option<&str> {
        self.0.web_info_url()
    }
}

/// A named surface feature on a body. Locations have no info page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location(EntityHandle);

impl Location {
    pub fn handle(&self) -> &EntityHandle {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }
}

// =============================================================================
// ASTRO OBJECT
// =============================================================================

/// An entity handle re-typed as one of the four concrete kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstroObject {
    Star(Star),
    Body(Body),
    DeepSky(DeepSkyObject),
    Location(Location),
}

impl AstroObject {
    /// Type a raw handle by asking its catalog for the kind.
    ///
    /// Returns `None` for generic matches, unknown ids and handles whose
    /// catalog no longer exists.
    pub fn classify(handle: EntityHandle) -> Option<Self> {
        let object = match handle.kind()? {
            EntityKind::Star => Self::Star(Star(handle)),
            EntityKind::Body => Self::Body(Body(handle)),
            EntityKind::DeepSky => Self::DeepSky(DeepSkyObject(handle)),
            EntityKind::Location => Self::Location(Location(handle)),
            EntityKind::Generic => return None,
        };
        Some(object)
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Star(_) => EntityKind::Star,
            Self::Body(_) => EntityKind::Body,
            Self::DeepSky(_) => EntityKind::DeepSky,
            Self::Location(_) => EntityKind::Location,
        }
    }

    pub fn handle(&self) -> &EntityHandle {
        match self {
            Self::Star(star) => star.handle(),
            Self::Body(body) => body.handle(),
            Self::DeepSky(dso) => dso.handle(),
            Self::Location(location) => location.handle(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.handle().name()
    }
}

impl From<Star> for AstroObject {
    fn from(star: Star) -> Self {
        Self::Star(star)
    }
}

impl From<Body> for AstroObject {
    fn from(body: Body) -> Self {
        Self::Body(body)
    }
}

impl From<DeepSkyObject> for AstroObject {
    fn from(dso: DeepSkyObject) -> Self {
        Self::DeepSky(dso)
    }
}

impl From<Location> for AstroObject {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

// =============================================================================
// TESTS
// =============================================================================

// Object Catalog - Named stars, bodies, deep-sky objects and locations
// Parsed from JSON catalog files and owned by the sandbox engine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::entity::{EntityCatalog, EntityId, EntityKind};
use crate::error::EngineError;

// =============================================================================
// CATALOG FILE FORMAT
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub stars: Vec<CatalogEntry>,
    #[serde(default)]
    pub bodies: Vec<BodyEntry>,
    #[serde(default)]
    pub deep_sky: Vec<CatalogEntry>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
    /// Reference points with no typed object behind them.
    #[serde(default)]
    pub markers: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub info_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub body_type: BodyType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Name of the body the location sits on.
    pub body: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BodyType {
    Planet,
    DwarfPlanet,
    Moon,
    Asteroid,
    Comet,
    Spacecraft,
}

/// Read and parse one JSON file.
pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, EngineError> {
    let text = fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EngineError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

// =============================================================================
// IN-MEMORY CATALOG
// =============================================================================

#[derive(Debug, Clone)]
pub struct CatalogObject {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub aliases: Vec<String>,
    pub info_url: Option<String>,
    pub body_type: Option<BodyType>,
    /// Owning body, for locations.
    pub parent: Option<String>,
}

impl CatalogObject {
    fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// All objects known to a loaded simulation. Ids are assigned in load order
/// and never reused within one catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    objects: Vec<CatalogObject>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog used when the engine is started without a config file.
    pub fn builtin() -> Self {
        let entry = |name: &str, info_url: Option<&str>| CatalogEntry {
            name: name.to_string(),
            aliases: Vec::new(),
            info_url: info_url.map(str::to_string),
        };
        let body = |name: &str, body_type: BodyType, info_url: &str| BodyEntry {
            entry: entry(name, Some(info_url)),
            body_type,
        };

        let mut sun = entry("Sun", Some("https://en.wikipedia.org/wiki/Sun"));
        sun.aliases.push("Sol".to_string());
        let mut m31 = entry(
            "Andromeda Galaxy",
            Some("https://en.wikipedia.org/wiki/Andromeda_Galaxy"),
        );
        m31.aliases.push("M31".to_string());

        let file = CatalogFile {
            stars: vec![
                sun,
                entry("Sirius", Some("https://en.wikipedia.org/wiki/Sirius")),
            ],
            bodies: vec![
                body("Earth", BodyType::Planet, "https://en.wikipedia.org/wiki/Earth"),
                body("Moon", BodyType::Moon, "https://en.wikipedia.org/wiki/Moon"),
                body("Mars", BodyType::Planet, "https://en.wikipedia.org/wiki/Mars"),
            ],
            deep_sky: vec![m31],
            locations: vec![
                LocationEntry {
                    entry: entry("Olympus Mons", None),
                    body: "Mars".to_string(),
                },
                LocationEntry {
                    entry: entry("Mare Tranquillitatis", None),
                    body: "Moon".to_string(),
                },
            ],
            markers: vec![entry("Galactic Center", None)],
        };

        let mut catalog = Self::new();
        catalog.merge(file);
        catalog
    }

    /// Append every object of `file`.
    pub fn merge(&mut self, file: CatalogFile) {
        for star in file.stars {
            self.push(EntityKind::Star, star, None, None);
        }
        for body in file.bodies {
            self.push(EntityKind::Body, body.entry, Some(body.body_type), None);
        }
        for dso in file.deep_sky {
            self.push(EntityKind::DeepSky, dso, None, None);
        }
        for location in file.locations {
            self.push(EntityKind::Location, location.entry, None, Some(location.body));
        }
        for marker in file.markers {
            self.push(EntityKind::Generic, marker, None, None);
        }
    }

    fn push(
        &mut self,
        kind: EntityKind,
        entry: CatalogEntry,
        body_type: Option<BodyType>,
        parent: Option<String>,
    ) {
        let id = EntityId(self.objects.len() as u64 + 1);
        self.objects.push(CatalogObject {
            id,
            kind,
            name: entry.name,
            aliases: entry.aliases,
            info_url: entry.info_url,
            body_type,
            parent,
        });
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&CatalogObject> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.objects.get(index)
    }

    /// First object whose name or alias matches, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&CatalogObject> {
        let name = name.trim();
        self.objects.iter().find(|o| o.answers_to(name))
    }

    /// Distinct primary names starting with `prefix` (ASCII case-insensitive),
    /// in load order, at most `limit`.
    pub fn completions(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.to_ascii_lowercase();
        let mut names: Vec<String> = Vec::new();
        for object in &self.objects {
            if names.len() >= limit {
                break;
            }
            if object.name.to_ascii_lowercase().starts_with(&prefix)
                && !names.contains(&object.name)
            {
                names.push(object.name.clone());
            }
        }
        names
    }
}

impl EntityCatalog for Catalog {
    fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.get(id).map(|o| o.kind)
    }

    fn name(&self, id: EntityId) -> Option<String> {
        self.get(id).map(|o| o.name.clone())
    }

    fn web_info_url(&self, id: EntityId) -> Option<String> {
        self.get(id)?.info_url.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

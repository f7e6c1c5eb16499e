// Selection - The currently chosen simulated entity, if any
// A sum type over the four concrete entity kinds plus "nothing" and "generic match".

use serde::{Deserialize, Serialize};

use crate::entity::{AstroObject, Body, DeepSkyObject, EntityHandle, EntityKind, Location, Star};

// =============================================================================
// DISCRIMINANT
// =============================================================================

/// Tag identifying which kind of entity a [`Selection`] holds.
///
/// The numeric codes are stable and used when a selection crosses a host
/// boundary as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum SelectionKind {
    None = 0,
    Star = 1,
    Body = 2,
    DeepSky = 3,
    Location = 4,
    Generic = 5,
}

impl SelectionKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for SelectionKind {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Star),
            2 => Ok(Self::Body),
            3 => Ok(Self::DeepSky),
            4 => Ok(Self::Location),
            5 => Ok(Self::Generic),
            other => Err(other),
        }
    }
}

// =============================================================================
// GENERIC MATCH
// =============================================================================

/// Handle the engine classified as [`EntityKind::Generic`].
///
/// Only [`Selection::from_handle`] builds one, so a generic selection never
/// wraps a star, body, deep-sky object or location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMatch(EntityHandle);

impl GenericMatch {
    pub fn handle(&self) -> &EntityHandle {
        &self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// The chosen entity and its kind.
///
/// A selection is a plain value: it holds a non-owning
/// [`EntityHandle`] and never keeps engine data alive. Dropping it releases
/// nothing but the handle itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Star(Star),
    Body(Body),
    DeepSky(DeepSkyObject),
    Location(Location),
    /// Engine-classified match that has no typed object behind it.
    Generic(GenericMatch),
}

impl Selection {
    /// Select an already-typed object. `None` in, [`Selection::None`] out.
    pub fn create(object: Option<AstroObject>) -> Self {
        match object {
            Some(AstroObject::Star(star)) => Self::Star(star),
            Some(AstroObject::Body(body)) => Self::Body(body),
            Some(AstroObject::DeepSky(dso)) => Self::DeepSky(dso),
            Some(AstroObject::Location(location)) => Self::Location(location),
            None => Self::None,
        }
    }

    /// Classify a raw engine handle.
    ///
    /// This is the engine-side constructor and the only one that yields
    /// [`Selection::Generic`]. Handles of unknown kind, or whose catalog is
    /// gone, give [`Selection::None`].
    pub fn from_handle(handle: EntityHandle) -> Self {
        match handle.kind() {
            Some(EntityKind::Generic) => Self::Generic(GenericMatch(handle)),
            Some(_) => Self::create(AstroObject::classify(handle)),
            None => Self::None,
        }
    }

    pub fn kind(&self) -> SelectionKind {
        match self {
            Self::None => SelectionKind::None,
            Self::Star(_) => SelectionKind::Star,
            Self::Body(_) => SelectionKind::Body,
            Self::DeepSky(_) => SelectionKind::DeepSky,
            Self::Location(_) => SelectionKind::Location,
            Self::Generic(_) => SelectionKind::Generic,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn handle(&self) -> Option<&EntityHandle> {
        match self {
            Self::None => None,
            Self::Star(star) => Some(star.handle()),
            Self::Body(body) => Some(body.handle()),
            Self::DeepSky(dso) => Some(dso.handle()),
            Self::Location(location) => Some(location.handle()),
            Self::Generic(generic) => Some(generic.handle()),
        }
    }

    /// The held entity re-typed as a concrete kind. `None` for empty and
    /// generic selections.
    pub fn object(&self) -> Option<AstroObject> {
        match self {
            Self::Star(star) => Some(AstroObject::Star(star.clone())),
            Self::Body(body) => Some(AstroObject::Body(body.clone())),
            Self::DeepSky(dso) => Some(AstroObject::DeepSky(dso.clone())),
            Self::Location(location) => Some(AstroObject::Location(location.clone())),
            Self::None | Self::Generic(_) => None,
        }
    }

    pub fn as_star(&self) -> Option<&Star> {
        match self {
            Self::Star(star) => Some(star),
            _ => None,
        }
    }

    pub fn as_body(&self) -> Option<&Body> {
        match self {
            Self::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_deep_sky(&self) -> Option<&DeepSkyObject> {
        match self {
            Self::DeepSky(dso) => Some(dso),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&Location> {
        match self {
            Self::Location(location) => Some(location),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.handle()?.name()
    }

    /// Info page of the held object. Only stars, bodies and deep-sky objects
    /// have one.
    pub fn web_info_url(&self) -> Option<&str> {
        match self {
            Self::Star(star) => star.web_info_url(),
            Self::Body(body) => body.web_info_url(),
            Self::DeepSky(dso) => dso.web_info_url(),
            Self::Location(_) | Self::Generic(_) | Self::None => None,
        }
    }

    pub fn info(&self) -> SelectionInfo {
        SelectionInfo {
            kind: self.kind(),
            name: self.name().map(str::to_owned),
            web_info_url: self.web_info_url().map(str::to_owned),
        }
    }
}

impl From<AstroObject> for Selection {
    fn from(object: AstroObject) -> Self {
        Self::create(Some(object))
    }
}

// =============================================================================
// SERIALIZABLE SUMMARY FOR THE HOST UI
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionInfo {
    pub kind: SelectionKind,
    pub name: Option<String>,
    pub web_info_url: Option<String>,
}

// =============================================================================
// TESTS
// =============================================================================

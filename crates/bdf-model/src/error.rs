//! Error types for bdf-model

use std::fmt::{self, Display, Formatter};

use bdf_inp::{CardError, FieldError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Entity category; ids are unique within a category only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Node,
    Coord,
    Element,
    Property,
    Material,
    LoadSet,
    SpcSet,
    MpcSet,
    SpcAdd,
    MpcAdd,
    Param,
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Node => "node",
            Category::Coord => "coordinate system",
            Category::Element => "element",
            Category::Property => "property",
            Category::Material => "material",
            Category::LoadSet => "load set",
            Category::SpcSet => "SPC set",
            Category::MpcSet => "MPC set",
            Category::SpcAdd => "SPCADD",
            Category::MpcAdd => "MPCADD",
            Category::Param => "PARAM",
        };
        f.write_str(name)
    }
}

/// Key of an entity inside its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKey {
    Id(i32),
    Name(String),
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{id}"),
            EntityKey::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Card(#[from] CardError),

    #[error("duplicate {category} {id}: existing {existing:?}, incoming {incoming:?}")]
    DuplicateEntity {
        category: Category,
        id: EntityKey,
        existing: Vec<String>,
        incoming: Vec<String>,
    },

    #[error("{referrer} field {field} references missing {category} {id}")]
    DanglingReference {
        /// Card name and id of the referring entity, e.g. `CBAR 10`.
        referrer: String,
        field: String,
        category: Category,
        id: i32,
    },

    #[error("coordinate system chain {chain:?} is cyclic")]
    CoordinateCycle { chain: Vec<i32> },

    #[error("{element_type} {element} cannot use {property_type} {property}")]
    PropertyMismatch {
        element: i32,
        element_type: String,
        property: i32,
        property_type: String,
    },

    #[error("material {id}: {message}")]
    InvalidMaterial { id: i32, message: String },

    #[error("degenerate geometry in {entity}: {message}")]
    DegenerateGeometry { entity: String, message: String },

    #[error("model is not cross-referenced")]
    NotCrossReferenced,

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl ModelError {
    pub fn dangling(
        referrer: impl Into<String>,
        field: impl Into<String>,
        category: Category,
        id: i32,
    ) -> Self {
        Self::DanglingReference {
            referrer: referrer.into(),
            field: field.into(),
            category,
            id,
        }
    }

    pub fn degenerate(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

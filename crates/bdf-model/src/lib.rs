//! NASTRAN bulk data entity graph.
//!
//! Cards from `bdf-inp` are dispatched through a [`CardRegistry`] into typed
//! entities held by a [`BdfModel`]. Entities refer to each other by id;
//! [`BdfModel::cross_reference`] validates those ids and resolves coordinate
//! systems, after which geometry and mass queries are available.

pub mod constraints;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod loads;
pub mod mass;
pub mod materials;
pub mod mesh;
pub mod model;
pub mod params;
pub mod properties;
pub mod registry;
pub mod summary;
pub mod xref;

pub use constraints::{Constraint, MpcTerm, SpcEntry};
pub use coords::{BASIC, CoordDef, CoordKind, CoordSystem, Frame};
pub use error::{Category, EntityKey, ModelError, Result};
pub use loads::{Load, Pload, Pload2, PointLoad, PointLoadKind};
pub use mass::{MassProperties, MassQuery};
pub use materials::{Mat1, Mat2, Mat3, Mat8, Mat9, Material};
pub use mesh::{Element, ElementData, ElementFamily, ElementType, Node, Orientation, ThetaMcid};
pub use model::BdfModel;
pub use params::Param;
pub use properties::{BeamStation, PBar, PBeam, PComp, PElas, PRod, PShell, PSolid, PTube, Ply, Property};
pub use registry::{CardRegistry, Constructed, Constructor, Entity, ReadConfig, Reject};
pub use summary::ModelSummary;
pub use xref::{XrefMode, XrefReport};

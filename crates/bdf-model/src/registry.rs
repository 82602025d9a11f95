//! Card name to entity constructor dispatch.

use std::collections::{BTreeMap, BTreeSet};

use bdf_inp::{Card, FieldValue};

use crate::constraints::Constraint;
use crate::coords::CoordSystem;
use crate::error::{Category, EntityKey, Result};
use crate::loads::Load;
use crate::materials::Material;
use crate::mesh::{Element, ElementType, Node};
use crate::params::Param;
use crate::properties::Property;

/// Any record a card can construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(Node),
    Coord(CoordSystem),
    Element(Element),
    Property(Property),
    Material(Material),
    Load(Load),
    Constraint(Constraint),
    Param(Param),
}

impl Entity {
    /// Category the entity's id is unique in.
    pub fn category(&self) -> Category {
        match self {
            Entity::Node(_) => Category::Node,
            Entity::Coord(_) => Category::Coord,
            Entity::Element(_) => Category::Element,
            Entity::Property(_) => Category::Property,
            Entity::Material(_) => Category::Material,
            Entity::Load(_) => Category::LoadSet,
            Entity::Constraint(c) => match c {
                Constraint::Spc { .. } | Constraint::Spc1 { .. } => Category::SpcSet,
                Constraint::Mpc { .. } => Category::MpcSet,
                Constraint::SpcAdd { .. } => Category::SpcAdd,
                Constraint::MpcAdd { .. } => Category::MpcAdd,
            },
            Entity::Param(_) => Category::Param,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Entity::Node(n) => EntityKey::Id(n.id),
            Entity::Coord(c) => EntityKey::Id(c.id),
            Entity::Element(e) => EntityKey::Id(e.id),
            Entity::Property(p) => EntityKey::Id(p.id()),
            Entity::Material(m) => EntityKey::Id(m.id()),
            Entity::Load(l) => EntityKey::Id(l.sid()),
            Entity::Constraint(c) => EntityKey::Id(c.sid()),
            Entity::Param(p) => EntityKey::Name(p.name.clone()),
        }
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        match self {
            Entity::Node(n) => n.raw_fields(),
            Entity::Coord(c) => c.raw_fields(),
            Entity::Element(e) => e.raw_fields(),
            Entity::Property(p) => p.raw_fields(),
            Entity::Material(m) => m.raw_fields(),
            Entity::Load(l) => l.raw_fields(),
            Entity::Constraint(c) => c.raw_fields(),
            Entity::Param(p) => p.raw_fields(),
        }
    }
}

/// A card kept as read because no constructor handles it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reject {
    pub name: String,
    /// Raw field texts, used when there are no original lines
    pub fields: Vec<String>,
    /// Original physical lines
    pub lines: Vec<String>,
    /// First line number
    pub line: usize,
}

impl Reject {
    pub fn from_card(card: &Card) -> Self {
        Self {
            name: card.name.clone(),
            fields: card.fields.clone(),
            lines: card.lines.clone(),
            line: card.line,
        }
    }
}

/// Result of dispatching one card.
#[derive(Debug, Clone, PartialEq)]
pub enum Constructed {
    Entities(Vec<Entity>),
    Reject(Reject),
}

/// Card reading configuration.
#[derive(Debug, Clone, Default)]
pub struct ReadConfig {
    /// Card names read as rejects even when a constructor exists
    pub skip_cards: BTreeSet<String>,
}

impl ReadConfig {
    pub fn skip_card(mut self, name: &str) -> Self {
        self.skip_cards.insert(name.trim().to_ascii_uppercase());
        self
    }
}

/// Builds entities from one card.
pub type Constructor = fn(&Card) -> Result<Vec<Entity>>;

/// Table of card constructors keyed by card name.
#[derive(Debug, Clone)]
pub struct CardRegistry {
    constructors: BTreeMap<String, Constructor>,
    config: ReadConfig,
}

impl Default for CardRegistry {
    fn default() -> Self {
        Self::new(ReadConfig::default())
    }
}

macro_rules! wrap {
    ($variant:ident, $f:expr) => {
        |card: &Card| -> Result<Vec<Entity>> {
            Ok($f(card)?.into_iter().map(Entity::$variant).collect())
        }
    };
}

macro_rules! element {
    ($f:expr, $t:expr) => {
        |card: &Card| -> Result<Vec<Entity>> { Ok(vec![Entity::Element($f(card, $t)?)]) }
    };
}

impl CardRegistry {
    /// Registry with every supported card.
    pub fn new(config: ReadConfig) -> Self {
        let mut registry = Self {
            constructors: BTreeMap::new(),
            config,
        };
        let table: [(&str, Constructor); 45] = [
            ("GRID", |card| Ok(vec![Entity::Node(Node::from_card(card)?)])),
            ("CORD1R", wrap!(Coord, CoordSystem::from_cord1)),
            ("CORD1C", wrap!(Coord, CoordSystem::from_cord1)),
            ("CORD1S", wrap!(Coord, CoordSystem::from_cord1)),
            ("CORD2R", |card| Ok(vec![Entity::Coord(CoordSystem::from_cord2(card)?)])),
            ("CORD2C", |card| Ok(vec![Entity::Coord(CoordSystem::from_cord2(card)?)])),
            ("CORD2S", |card| Ok(vec![Entity::Coord(CoordSystem::from_cord2(card)?)])),
            ("CROD", element!(Element::rod_from_card, ElementType::Crod)),
            ("CTUBE", element!(Element::rod_from_card, ElementType::Ctube)),
            ("CONROD", |card| Ok(vec![Entity::Element(Element::conrod_from_card(card)?)])),
            ("CBAR", element!(Element::bar_from_card, ElementType::Cbar)),
            ("CBEAM", element!(Element::bar_from_card, ElementType::Cbeam)),
            ("CTRIA3", element!(Element::shell_from_card, ElementType::Ctria3)),
            ("CTRIA6", element!(Element::shell_from_card, ElementType::Ctria6)),
            ("CQUAD4", element!(Element::shell_from_card, ElementType::Cquad4)),
            ("CQUAD8", element!(Element::shell_from_card, ElementType::Cquad8)),
            ("CTETRA", element!(Element::solid_from_card, ElementType::Ctetra)),
            ("CPENTA", element!(Element::solid_from_card, ElementType::Cpenta)),
            ("CHEXA", element!(Element::solid_from_card, ElementType::Chexa)),
            ("CELAS1", |card| Ok(vec![Entity::Element(Element::celas1_from_card(card)?)])),
            ("CELAS2", |card| Ok(vec![Entity::Element(Element::celas2_from_card(card)?)])),
            ("CONM2", |card| Ok(vec![Entity::Element(Element::conm2_from_card(card)?)])),
            ("PROD", wrap!(Property, Property::prod_from_card)),
            ("PTUBE", wrap!(Property, Property::ptube_from_card)),
            ("PBAR", wrap!(Property, Property::pbar_from_card)),
            ("PBEAM", wrap!(Property, Property::pbeam_from_card)),
            ("PSHELL", wrap!(Property, Property::pshell_from_card)),
            ("PCOMP", wrap!(Property, Property::pcomp_from_card)),
            ("PSOLID", wrap!(Property, Property::psolid_from_card)),
            ("PELAS", wrap!(Property, Property::pelas_from_card)),
            ("MAT1", wrap!(Material, Material::mat1_from_card)),
            ("MAT2", wrap!(Material, Material::mat2_from_card)),
            ("MAT3", wrap!(Material, Material::mat3_from_card)),
            ("MAT8", wrap!(Material, Material::mat8_from_card)),
            ("MAT9", wrap!(Material, Material::mat9_from_card)),
            ("FORCE", wrap!(Load, Load::force_from_card)),
            ("MOMENT", wrap!(Load, Load::moment_from_card)),
            ("PLOAD", wrap!(Load, Load::pload_from_card)),
            ("PLOAD2", wrap!(Load, Load::pload2_from_card)),
            ("SPC", wrap!(Constraint, Constraint::spc_from_card)),
            ("SPC1", wrap!(Constraint, Constraint::spc1_from_card)),
            ("MPC", wrap!(Constraint, Constraint::mpc_from_card)),
            ("SPCADD", wrap!(Constraint, Constraint::spcadd_from_card)),
            ("MPCADD", wrap!(Constraint, Constraint::mpcadd_from_card)),
            ("PARAM", wrap!(Param, Param::from_card)),
        ];
        for (name, constructor) in table {
            registry.register(name, constructor);
        }
        registry
    }

    /// Add or replace the constructor for `name`.
    pub fn register(&mut self, name: &str, constructor: Constructor) {
        self.constructors
            .insert(name.trim().to_ascii_uppercase(), constructor);
    }

    /// Whether `name` is read into entities.
    pub fn handles(&self, name: &str) -> bool {
        self.constructors.contains_key(name) && !self.config.skip_cards.contains(name)
    }

    /// Card names with a constructor.
    pub fn card_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Dispatch a card to its constructor.
    pub fn construct(&self, card: &Card) -> Result<Constructed> {
        match self.constructors.get(&card.name) {
            Some(constructor) if !self.config.skip_cards.contains(&card.name) => {
                Ok(Constructed::Entities(constructor(card)?))
            }
            _ => Ok(Constructed::Reject(Reject::from_card(card))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_name() {
        let registry = CardRegistry::default();
        let card = Card::from_fields(&["GRID", "1", "", "0.", "0.", "0."]);
        match registry.construct(&card).unwrap() {
            Constructed::Entities(entities) => {
                assert_eq!(entities.len(), 1);
                assert_eq!(entities[0].category(), Category::Node);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_and_skipped_cards_are_rejects() {
        let registry = CardRegistry::new(ReadConfig::default().skip_card("grid"));
        let grid = Card::from_fields(&["GRID", "1"]);
        assert!(matches!(registry.construct(&grid), Ok(Constructed::Reject(_))));
        assert!(!registry.handles("GRID"));

        let unknown = Card::from_fields(&["CAERO1", "1"]);
        match registry.construct(&unknown).unwrap() {
            Constructed::Reject(reject) => assert_eq!(reject.name, "CAERO1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn constructors_can_be_added() {
        let mut registry = CardRegistry::default();
        registry.register("GRDPNT", |card| {
            Ok(vec![Entity::Param(Param::new(
                "GRDPNT",
                vec![card.classify(1)],
            ))])
        });
        let card = Card::from_fields(&["GRDPNT", "0"]);
        assert!(matches!(registry.construct(&card), Ok(Constructed::Entities(_))));
    }

    #[test]
    fn pelas_yields_two_entities() {
        let registry = CardRegistry::default();
        let card = Card::from_fields(&["PELAS", "1", "1.+5", "", "", "2", "2.+5"]);
        let Constructed::Entities(entities) = registry.construct(&card).unwrap() else {
            panic!("expected entities")
        };
        let keys: Vec<EntityKey> = entities.iter().map(Entity::key).collect();
        assert_eq!(keys, vec![EntityKey::Id(1), EntityKey::Id(2)]);
    }

    #[test]
    fn decode_errors_surface() {
        let registry = CardRegistry::default();
        let card = Card::from_fields(&["GRID", "1.5"]);
        assert!(registry.construct(&card).is_err());
    }
}

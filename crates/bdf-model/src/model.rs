//! The bulk data model: per-category entity maps keyed by id.

use std::collections::{BTreeMap, BTreeSet};

use bdf_inp::{Card, FieldValue};
use tracing::{debug, warn};

use crate::constraints::{Constraint, resolve_union};
use crate::coords::{BASIC, CoordSystem};
use crate::error::{Category, ModelError, Result};
use crate::loads::Load;
use crate::materials::Material;
use crate::mesh::{Element, ElementType, Node};
use crate::params::Param;
use crate::properties::Property;
use crate::registry::{CardRegistry, Constructed, Entity, Reject};
use crate::xref::XrefCache;

/// A NASTRAN model: control decks, bulk data entities and rejects.
///
/// Entities reference each other by id only. [`BdfModel::cross_reference`]
/// validates those ids and caches resolved coordinate frames and node
/// positions; any mutation drops the cache.
#[derive(Debug, Clone)]
pub struct BdfModel {
    /// Executive control lines up to and including `CEND`
    pub executive_control: Vec<String>,
    /// Case control lines up to and including `BEGIN BULK`
    pub case_control: Vec<String>,
    nodes: BTreeMap<i32, Node>,
    coords: BTreeMap<i32, CoordSystem>,
    elements: BTreeMap<i32, Element>,
    properties: BTreeMap<i32, Property>,
    materials: BTreeMap<i32, Material>,
    loads: BTreeMap<i32, Vec<Load>>,
    spcs: BTreeMap<i32, Vec<Constraint>>,
    mpcs: BTreeMap<i32, Vec<Constraint>>,
    spcadds: BTreeMap<i32, Constraint>,
    mpcadds: BTreeMap<i32, Constraint>,
    params: BTreeMap<String, Param>,
    rejects: Vec<Reject>,
    parse_errors: Vec<ModelError>,
    pub(crate) xref_errors: Vec<ModelError>,
    pub(crate) xref: Option<XrefCache>,
}

impl Default for BdfModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BdfModel {
    /// Empty model holding only the basic coordinate system.
    pub fn new() -> Self {
        Self {
            executive_control: Vec::new(),
            case_control: Vec::new(),
            nodes: BTreeMap::new(),
            coords: BTreeMap::from([(BASIC, CoordSystem::basic())]),
            elements: BTreeMap::new(),
            properties: BTreeMap::new(),
            materials: BTreeMap::new(),
            loads: BTreeMap::new(),
            spcs: BTreeMap::new(),
            mpcs: BTreeMap::new(),
            spcadds: BTreeMap::new(),
            mpcadds: BTreeMap::new(),
            params: BTreeMap::new(),
            rejects: Vec::new(),
            parse_errors: Vec::new(),
            xref_errors: Vec::new(),
            xref: None,
        }
    }

    /// Construct the entities of one card and add them, or keep the card
    /// as a reject when no constructor handles it.
    pub fn add_card(&mut self, card: &Card, registry: &CardRegistry) -> Result<()> {
        match registry.construct(card)? {
            Constructed::Entities(entities) => {
                for (i, entity) in entities.iter().enumerate() {
                    self.check_unique(entity, &entities[..i])?;
                }
                for entity in entities {
                    self.add_entity(entity)?;
                }
            }
            Constructed::Reject(reject) => {
                warn!(card = %reject.name, line = reject.line, "rejecting card");
                self.add_reject(reject);
            }
        }
        Ok(())
    }

    /// Add one entity.
    ///
    /// Loads and SPC/MPC records accumulate per set id. Everything else is
    /// unique per id (per name for params); a second, different record with
    /// the same key is a [`ModelError::DuplicateEntity`]. An identical
    /// repeat is ignored.
    pub fn add_entity(&mut self, entity: Entity) -> Result<()> {
        self.xref = None;
        match entity {
            Entity::Load(load) => {
                self.loads.entry(load.sid()).or_default().push(load);
                Ok(())
            }
            Entity::Constraint(c @ (Constraint::Spc { .. } | Constraint::Spc1 { .. })) => {
                self.spcs.entry(c.sid()).or_default().push(c);
                Ok(())
            }
            Entity::Constraint(c @ Constraint::Mpc { .. }) => {
                self.mpcs.entry(c.sid()).or_default().push(c);
                Ok(())
            }
            Entity::Constraint(c @ Constraint::SpcAdd { .. }) => {
                insert_unique(&mut self.spcadds, c.sid(), c, Entity::Constraint)
            }
            Entity::Constraint(c @ Constraint::MpcAdd { .. }) => {
                insert_unique(&mut self.mpcadds, c.sid(), c, Entity::Constraint)
            }
            Entity::Node(n) => insert_unique(&mut self.nodes, n.id, n, Entity::Node),
            Entity::Coord(c) => insert_unique(&mut self.coords, c.id, c, Entity::Coord),
            Entity::Element(e) => insert_unique(&mut self.elements, e.id, e, Entity::Element),
            Entity::Property(p) => insert_unique(&mut self.properties, p.id(), p, Entity::Property),
            Entity::Material(m) => insert_unique(&mut self.materials, m.id(), m, Entity::Material),
            Entity::Param(p) => insert_unique(&mut self.params, p.name.clone(), p, Entity::Param),
        }
    }

    /// Fail when `entity` collides with a stored record or with one of
    /// `staged`, the records constructed before it from the same card.
    fn check_unique(&self, entity: &Entity, staged: &[Entity]) -> Result<()> {
        if matches!(
            entity.category(),
            Category::LoadSet | Category::SpcSet | Category::MpcSet
        ) {
            return Ok(());
        }
        let key = entity.key();
        let stored = self.stored(entity);
        let earlier = staged
            .iter()
            .filter(|e| e.category() == entity.category() && e.key() == key);
        match stored.iter().chain(earlier).find(|e| *e != entity) {
            Some(existing) => Err(duplicate(existing, entity)),
            None => Ok(()),
        }
    }

    /// The stored record sharing the key of `entity`.
    fn stored(&self, entity: &Entity) -> Option<Entity> {
        match entity {
            Entity::Node(n) => self.nodes.get(&n.id).cloned().map(Entity::Node),
            Entity::Coord(c) => self.coords.get(&c.id).cloned().map(Entity::Coord),
            Entity::Element(e) => self.elements.get(&e.id).cloned().map(Entity::Element),
            Entity::Property(p) => self.properties.get(&p.id()).cloned().map(Entity::Property),
            Entity::Material(m) => self.materials.get(&m.id()).cloned().map(Entity::Material),
            Entity::Param(p) => self.params.get(&p.name).cloned().map(Entity::Param),
            Entity::Constraint(c @ Constraint::SpcAdd { .. }) => {
                self.spcadds.get(&c.sid()).cloned().map(Entity::Constraint)
            }
            Entity::Constraint(c @ Constraint::MpcAdd { .. }) => {
                self.mpcadds.get(&c.sid()).cloned().map(Entity::Constraint)
            }
            Entity::Constraint(_) | Entity::Load(_) => None,
        }
    }

    pub fn add_reject(&mut self, reject: Reject) {
        self.rejects.push(reject);
    }

    /// Queue a card that failed to construct.
    pub fn push_parse_error(&mut self, error: ModelError) {
        warn!(%error, "card dropped");
        self.parse_errors.push(error);
    }

    /// Take the queued construction errors.
    pub fn pop_parse_errors(&mut self) -> Vec<ModelError> {
        std::mem::take(&mut self.parse_errors)
    }

    /// Take the problems recorded by the last safe-mode cross-reference.
    pub fn pop_xref_errors(&mut self) -> Vec<ModelError> {
        std::mem::take(&mut self.xref_errors)
    }

    pub fn is_cross_referenced(&self) -> bool {
        self.xref.is_some()
    }

    pub fn nodes(&self) -> &BTreeMap<i32, Node> {
        &self.nodes
    }

    pub fn node(&self, id: i32) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Coordinate systems, including the basic system 0
    pub fn coords(&self) -> &BTreeMap<i32, CoordSystem> {
        &self.coords
    }

    pub fn coord(&self, id: i32) -> Option<&CoordSystem> {
        self.coords.get(&id)
    }

    pub fn elements(&self) -> &BTreeMap<i32, Element> {
        &self.elements
    }

    pub fn element(&self, id: i32) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn properties(&self) -> &BTreeMap<i32, Property> {
        &self.properties
    }

    pub fn property(&self, id: i32) -> Option<&Property> {
        self.properties.get(&id)
    }

    pub fn materials(&self) -> &BTreeMap<i32, Material> {
        &self.materials
    }

    pub fn material(&self, id: i32) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Load records grouped by load set id
    pub fn loads(&self) -> &BTreeMap<i32, Vec<Load>> {
        &self.loads
    }

    /// Records of one load case in card order
    pub fn load_case(&self, sid: i32) -> &[Load] {
        self.loads.get(&sid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// SPC and SPC1 records grouped by set id
    pub fn spcs(&self) -> &BTreeMap<i32, Vec<Constraint>> {
        &self.spcs
    }

    /// MPC records grouped by set id
    pub fn mpcs(&self) -> &BTreeMap<i32, Vec<Constraint>> {
        &self.mpcs
    }

    pub fn spcadds(&self) -> &BTreeMap<i32, Constraint> {
        &self.spcadds
    }

    pub fn mpcadds(&self) -> &BTreeMap<i32, Constraint> {
        &self.mpcadds
    }

    pub fn params(&self) -> &BTreeMap<String, Param> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(&name.to_ascii_uppercase())
    }

    pub fn rejects(&self) -> &[Reject] {
        &self.rejects
    }

    pub fn remove_node(&mut self, id: i32) -> Option<Node> {
        self.xref = None;
        self.nodes.remove(&id)
    }

    /// Remove a coordinate system; the basic system cannot be removed.
    pub fn remove_coord(&mut self, id: i32) -> Option<CoordSystem> {
        if id == BASIC {
            return None;
        }
        self.xref = None;
        self.coords.remove(&id)
    }

    pub fn remove_element(&mut self, id: i32) -> Option<Element> {
        self.xref = None;
        self.elements.remove(&id)
    }

    pub fn remove_property(&mut self, id: i32) -> Option<Property> {
        self.xref = None;
        self.properties.remove(&id)
    }

    pub fn remove_material(&mut self, id: i32) -> Option<Material> {
        self.xref = None;
        self.materials.remove(&id)
    }

    pub fn remove_load_set(&mut self, sid: i32) -> Option<Vec<Load>> {
        self.xref = None;
        self.loads.remove(&sid)
    }

    pub fn remove_param(&mut self, name: &str) -> Option<Param> {
        self.params.remove(&name.to_ascii_uppercase())
    }

    /// Property of an element, `None` for elements without one.
    pub fn element_property(&self, eid: i32) -> Option<&Property> {
        self.element(eid)?.pid.and_then(|pid| self.property(pid))
    }

    /// Materials a property references, in field order; missing ids are skipped.
    pub fn property_materials(&self, pid: i32) -> Vec<&Material> {
        self.property(pid)
            .map(|p| {
                p.material_refs()
                    .into_iter()
                    .filter_map(|(_, mid)| self.material(mid))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Coordinate system a node's position is given in.
    pub fn node_coord(&self, nid: i32) -> Option<&CoordSystem> {
        self.coord(self.node(nid)?.cp)
    }

    /// Nodes of an element in card order; blank and missing nodes are skipped.
    pub fn element_nodes(&self, eid: i32) -> Vec<&Node> {
        self.element(eid)
            .map(|e| e.node_ids().into_iter().filter_map(|n| self.node(n)).collect())
            .unwrap_or_default()
    }

    /// SPC and SPC1 records of a set, with SPCADD unions expanded.
    pub fn spc_set(&self, sid: i32) -> Vec<&Constraint> {
        collect_set(sid, &self.spcadds, &self.spcs)
    }

    /// MPC records of a set, with MPCADD unions expanded.
    pub fn mpc_set(&self, sid: i32) -> Vec<&Constraint> {
        collect_set(sid, &self.mpcadds, &self.mpcs)
    }

    /// Entities in write order: params, nodes, elements, properties,
    /// materials, loads, constraints, coordinate systems. The basic system
    /// is skipped.
    pub fn entities(&self) -> impl Iterator<Item = (Category, Vec<FieldValue>)> + '_ {
        let params = self.params.values().map(|p| (Category::Param, p.raw_fields()));
        let nodes = self.nodes.values().map(|n| (Category::Node, n.raw_fields()));
        let coords = self
            .coords
            .values()
            .filter(|c| c.id != BASIC)
            .map(|c| (Category::Coord, c.raw_fields()));
        let elements = self.elements.values().map(|e| (Category::Element, e.raw_fields()));
        let properties = self
            .properties
            .values()
            .map(|p| (Category::Property, p.raw_fields()));
        let materials = self
            .materials
            .values()
            .map(|m| (Category::Material, m.raw_fields()));
        let loads = self
            .loads
            .values()
            .flatten()
            .map(|l| (Category::LoadSet, l.raw_fields()));
        let spcs = self
            .spcs
            .values()
            .flatten()
            .chain(self.spcadds.values())
            .map(|c| (Category::SpcSet, c.raw_fields()));
        let mpcs = self
            .mpcs
            .values()
            .flatten()
            .chain(self.mpcadds.values())
            .map(|c| (Category::MpcSet, c.raw_fields()));
        params
            .chain(nodes)
            .chain(elements)
            .chain(properties)
            .chain(materials)
            .chain(loads)
            .chain(spcs)
            .chain(mpcs)
            .chain(coords)
    }

    /// Copy of the model with every CQUAD4 split into two CTRIA3.
    ///
    /// The first triangle keeps the quad's id; the second ones are numbered
    /// upward from the largest element id in element id order.
    pub fn with_quads_as_trias(&self) -> Result<BdfModel> {
        let mut next = self.elements.keys().next_back().copied().unwrap_or(0);
        let mut elements = BTreeMap::new();
        let mut split = 0usize;
        for element in self.elements.values() {
            if element.element_type == ElementType::Cquad4 {
                let id = next.checked_add(1).ok_or_else(|| {
                    ModelError::degenerate(element.label(), "no element id left for the second triangle")
                })?;
                if let Some(trias) = element.split_quad(id) {
                    next = id;
                    split += 1;
                    elements.extend(trias.map(|t| (t.id, t)));
                    continue;
                }
            }
            elements.insert(element.id, element.clone());
        }
        debug!(split, "quads split into triangles");
        let mut model = self.clone();
        model.elements = elements;
        model.xref = None;
        Ok(model)
    }
}

fn collect_set<'a>(
    sid: i32,
    unions: &'a BTreeMap<i32, Constraint>,
    records: &'a BTreeMap<i32, Vec<Constraint>>,
) -> Vec<&'a Constraint> {
    let members: BTreeMap<i32, Vec<i32>> = unions
        .iter()
        .filter_map(|(id, c)| match c {
            Constraint::SpcAdd { sets, .. } | Constraint::MpcAdd { sets, .. } => {
                Some((*id, sets.clone()))
            }
            _ => None,
        })
        .collect();
    let leaves: BTreeSet<i32> = resolve_union(sid, &members);
    leaves
        .iter()
        .filter_map(|leaf| records.get(leaf))
        .flatten()
        .collect()
}

fn insert_unique<K, T>(
    map: &mut BTreeMap<K, T>,
    key: K,
    value: T,
    wrap: fn(T) -> Entity,
) -> Result<()>
where
    K: Ord + Clone,
    T: Clone + PartialEq,
{
    match map.get(&key) {
        Some(existing) if *existing == value => {
            debug!("identical duplicate ignored");
            Ok(())
        }
        Some(existing) => Err(duplicate(&wrap(existing.clone()), &wrap(value))),
        None => {
            map.insert(key, value);
            Ok(())
        }
    }
}

fn duplicate(existing: &Entity, incoming: &Entity) -> ModelError {
    ModelError::DuplicateEntity {
        category: incoming.category(),
        id: incoming.key(),
        existing: field_texts(existing),
        incoming: field_texts(incoming),
    }
}

fn field_texts(entity: &Entity) -> Vec<String> {
    entity.raw_fields().iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKey;
    use crate::loads::{PointLoad, PointLoadKind};

    fn force(sid: i32, node: i32) -> Entity {
        Entity::Load(Load::Point(PointLoad {
            kind: PointLoadKind::Force,
            sid,
            node,
            cid: 0,
            scale: 1.0,
            direction: [1.0, 0.0, 0.0],
        }))
    }

    #[test]
    fn duplicate_ids_carry_both_field_lists() {
        let mut model = BdfModel::new();
        model.add_entity(Entity::Node(Node::new(1, 0.0, 0.0, 0.0))).unwrap();
        let err = model
            .add_entity(Entity::Node(Node::new(1, 1.0, 0.0, 0.0)))
            .unwrap_err();
        match err {
            ModelError::DuplicateEntity {
                category,
                id,
                existing,
                incoming,
            } => {
                assert_eq!(category, Category::Node);
                assert_eq!(id, EntityKey::Id(1));
                assert_eq!(existing[3], "0.");
                assert_eq!(incoming[3], "1.");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(model.node(1).map(|n| n.xyz[0]), Some(0.0));
    }

    #[test]
    fn identical_duplicates_are_ignored() {
        let mut model = BdfModel::new();
        model.add_entity(Entity::Node(Node::new(1, 0.0, 0.0, 0.0))).unwrap();
        model.add_entity(Entity::Node(Node::new(1, 0.0, 0.0, 0.0))).unwrap();
        assert_eq!(model.nodes().len(), 1);
    }

    #[test]
    fn ids_are_unique_per_category_only() {
        let mut model = BdfModel::new();
        model.add_entity(Entity::Node(Node::new(1, 0.0, 0.0, 0.0))).unwrap();
        let card = Card::from_fields(&["MAT1", "1", "2.+5", "", ".3"]);
        model.add_card(&card, &CardRegistry::default()).unwrap();
        assert!(model.material(1).is_some());
    }

    #[test]
    fn card_with_a_conflicting_record_adds_nothing() {
        let registry = CardRegistry::default();
        let mut model = BdfModel::new();
        model
            .add_card(&Card::from_fields(&["PELAS", "2", "50."]), &registry)
            .unwrap();
        let pair = Card::from_fields(&["PELAS", "1", "10.", "", "", "2", "20."]);
        let err = model.add_card(&pair, &registry).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateEntity {
                category: Category::Property,
                id: EntityKey::Id(2),
                ..
            }
        ));
        assert!(model.property(1).is_none());
        assert_eq!(model.properties().len(), 1);

        let clash = Card::from_fields(&["PELAS", "3", "10.", "", "", "3", "20."]);
        assert!(model.add_card(&clash, &registry).is_err());
        assert!(model.property(3).is_none());

        let repeat = Card::from_fields(&["PELAS", "4", "10.", "", "", "4", "10."]);
        model.add_card(&repeat, &registry).unwrap();
        assert!(model.property(4).is_some());
    }

    #[test]
    fn loads_accumulate_per_set() {
        let mut model = BdfModel::new();
        model.add_entity(force(1, 10)).unwrap();
        model.add_entity(force(1, 11)).unwrap();
        model.add_entity(force(2, 10)).unwrap();
        assert_eq!(model.load_case(1).len(), 2);
        assert!(model.load_case(3).is_empty());
    }

    #[test]
    fn second_param_with_the_same_name_is_a_duplicate() {
        let mut model = BdfModel::new();
        let registry = CardRegistry::default();
        model
            .add_card(&Card::from_fields(&["PARAM", "POST", "-1"]), &registry)
            .unwrap();
        let err = model
            .add_card(&Card::from_fields(&["PARAM", "post", "0"]), &registry)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::DuplicateEntity {
                category: Category::Param,
                ..
            }
        ));
    }

    #[test]
    fn spcadd_sets_expand() {
        let registry = CardRegistry::default();
        let mut model = BdfModel::new();
        for fields in [
            &["SPC1", "1", "123", "1"][..],
            &["SPC1", "2", "456", "2"],
            &["SPC", "3", "3", "1"],
            &["SPCADD", "10", "1", "2"],
            &["SPCADD", "20", "10", "3"],
        ] {
            model.add_card(&Card::from_fields(fields), &registry).unwrap();
        }
        assert_eq!(model.spc_set(20).len(), 3);
        assert_eq!(model.spc_set(2).len(), 1);
        assert!(model.mpc_set(20).is_empty());
    }

    #[test]
    fn unknown_cards_are_kept() {
        let mut model = BdfModel::new();
        let card = Card::from_fields(&["CAERO1", "1", "2"]);
        model.add_card(&card, &CardRegistry::default()).unwrap();
        assert_eq!(model.rejects().len(), 1);
        assert_eq!(model.rejects()[0].fields, vec!["CAERO1", "1", "2"]);
    }

    #[test]
    fn basic_system_is_always_present() {
        let mut model = BdfModel::new();
        assert!(model.coord(BASIC).is_some());
        assert!(model.remove_coord(BASIC).is_none());
        assert_eq!(model.entities().count(), 0);
    }

    #[test]
    fn coordinate_systems_are_listed_last() {
        let registry = CardRegistry::default();
        let mut model = BdfModel::new();
        for fields in [
            &["CORD2R", "5", "", "0.", "0.", "0.", "0.", "0.", "1.", "1.", "0.", "0."][..],
            &["GRID", "1", "5", "0.", "0.", "0."],
            &["MAT1", "3", "2.+5", "", ".3"],
        ] {
            model.add_card(&Card::from_fields(fields), &registry).unwrap();
        }
        let order: Vec<Category> = model.entities().map(|(c, _)| c).collect();
        assert_eq!(order, [Category::Node, Category::Material, Category::Coord]);
    }

    #[test]
    fn quads_split_into_numbered_triangles() {
        let registry = CardRegistry::default();
        let mut model = BdfModel::new();
        for fields in [
            &["CQUAD4", "3", "1", "1", "2", "3", "4"][..],
            &["CROD", "8", "2", "1", "2"],
            &["CQUAD4", "5", "1", "5", "6", "7", "8"],
        ] {
            model.add_card(&Card::from_fields(fields), &registry).unwrap();
        }
        let split = model.with_quads_as_trias().unwrap();
        let ids: Vec<i32> = split.elements().keys().copied().collect();
        assert_eq!(ids, [3, 5, 8, 9, 10]);
        assert_eq!(split.element(9).map(Element::node_ids), Some(vec![1, 3, 4]));
        assert_eq!(split.element(10).map(Element::node_ids), Some(vec![5, 7, 8]));
        assert_eq!(split.element(8).map(|e| e.element_type), Some(ElementType::Crod));
        assert_eq!(model.elements().len(), 3);

        let mut full = BdfModel::new();
        let last = Card::from_fields(&["CQUAD4", "2147483647", "1", "1", "2", "3", "4"]);
        full.add_card(&last, &registry).unwrap();
        assert!(full.with_quads_as_trias().is_err());
    }

    #[test]
    fn relationship_lookups() {
        let registry = CardRegistry::default();
        let mut model = BdfModel::new();
        for fields in [
            &["GRID", "1", "", "0.", "0.", "0."][..],
            &["GRID", "2", "", "1.", "0.", "0."],
            &["CROD", "5", "7", "1", "2"],
            &["PROD", "7", "3", "2."],
            &["MAT1", "3", "2.+5", "", ".3", "3."],
        ] {
            model.add_card(&Card::from_fields(fields), &registry).unwrap();
        }
        assert_eq!(model.element_property(5).map(Property::id), Some(7));
        assert_eq!(model.property_materials(7).len(), 1);
        assert_eq!(model.element_nodes(5).len(), 2);
        assert_eq!(model.node_coord(1).map(|c| c.id), Some(BASIC));
        assert!(model.remove_material(3).is_some());
        assert!(model.property_materials(7).is_empty());
    }
}

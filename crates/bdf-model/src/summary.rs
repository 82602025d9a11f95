//! Serializable overview of a model.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::mass::MassQuery;
use crate::model::BdfModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub nodes: usize,
    /// User coordinate systems (the basic system is not counted)
    pub coords: usize,
    pub elements: usize,
    pub properties: usize,
    pub materials: usize,
    pub load_sets: usize,
    pub spc_sets: usize,
    pub mpc_sets: usize,
    pub params: usize,
    pub rejects: usize,
    pub element_counts: BTreeMap<String, usize>,
    pub property_counts: BTreeMap<String, usize>,
    pub material_counts: BTreeMap<String, usize>,
    pub reject_counts: BTreeMap<String, usize>,
    pub executive_lines: usize,
    pub case_lines: usize,
    pub cross_referenced: bool,
    /// Total mass, when the model is cross-referenced and complete
    pub total_mass: Option<f64>,
    /// Center of gravity, with `total_mass`
    pub cg: Option<[f64; 3]>,
}

impl ModelSummary {
    pub fn from_model(model: &BdfModel) -> Self {
        let mut element_counts = BTreeMap::<String, usize>::new();
        for element in model.elements().values() {
            *element_counts
                .entry(element.element_type.card_name().to_string())
                .or_insert(0) += 1;
        }
        let mut property_counts = BTreeMap::<String, usize>::new();
        for property in model.properties().values() {
            *property_counts.entry(property.card_name().to_string()).or_insert(0) += 1;
        }
        let mut material_counts = BTreeMap::<String, usize>::new();
        for material in model.materials().values() {
            *material_counts.entry(material.card_name().to_string()).or_insert(0) += 1;
        }
        let mut reject_counts = BTreeMap::<String, usize>::new();
        for reject in model.rejects() {
            *reject_counts.entry(reject.name.clone()).or_insert(0) += 1;
        }

        let mass = model.mass_properties(&MassQuery::new()).ok();

        Self {
            nodes: model.nodes().len(),
            coords: model.coords().len().saturating_sub(1),
            elements: model.elements().len(),
            properties: model.properties().len(),
            materials: model.materials().len(),
            load_sets: model.loads().len(),
            spc_sets: model.spcs().len() + model.spcadds().len(),
            mpc_sets: model.mpcs().len() + model.mpcadds().len(),
            params: model.params().len(),
            rejects: model.rejects().len(),
            element_counts,
            property_counts,
            material_counts,
            reject_counts,
            executive_lines: model.executive_control.len(),
            case_lines: model.case_control.len(),
            cross_referenced: model.is_cross_referenced(),
            total_mass: mass.map(|m| m.mass),
            cg: mass.map(|m| [m.cg.x, m.cg.y, m.cg.z]),
        }
    }
}

//! Single- and multi-point constraints and their set aggregators.

use std::collections::{BTreeMap, BTreeSet};

use bdf_inp::{Card, FieldValue};

use crate::error::Result;
use crate::loads::id_list;

/// One enforced DOF group of an SPC card
#[derive(Debug, Clone, PartialEq)]
pub struct SpcEntry {
    /// Node ID
    pub node: i32,
    /// Constrained components, e.g. `123`
    pub components: String,
    /// Enforced displacement
    pub enforced: f64,
}

/// One term of an MPC equation
#[derive(Debug, Clone, PartialEq)]
pub struct MpcTerm {
    pub node: i32,
    pub component: String,
    pub coefficient: f64,
}

/// A constraint record.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// SPC: `SID G1 C1 D1 G2 C2 D2`
    Spc { sid: i32, entries: Vec<SpcEntry> },
    /// SPC1: `SID C G1 G2 ...` with THRU ranges
    Spc1 {
        sid: i32,
        components: String,
        nodes: Vec<i32>,
    },
    /// MPC: `SID G1 C1 A1 G2 C2 A2; - G3 C3 A3 G4 C4 A4; ...`
    Mpc { sid: i32, terms: Vec<MpcTerm> },
    /// SPCADD: `SID S1 S2 ...`
    SpcAdd { sid: i32, sets: Vec<i32> },
    /// MPCADD: `SID S1 S2 ...`
    MpcAdd { sid: i32, sets: Vec<i32> },
}

impl Constraint {
    pub fn sid(&self) -> i32 {
        match self {
            Constraint::Spc { sid, .. }
            | Constraint::Spc1 { sid, .. }
            | Constraint::Mpc { sid, .. }
            | Constraint::SpcAdd { sid, .. }
            | Constraint::MpcAdd { sid, .. } => *sid,
        }
    }

    pub fn card_name(&self) -> &'static str {
        match self {
            Constraint::Spc { .. } => "SPC",
            Constraint::Spc1 { .. } => "SPC1",
            Constraint::Mpc { .. } => "MPC",
            Constraint::SpcAdd { .. } => "SPCADD",
            Constraint::MpcAdd { .. } => "MPCADD",
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.card_name(), self.sid())
    }

    /// Node ids referenced by the record
    pub fn node_ids(&self) -> Vec<i32> {
        match self {
            Constraint::Spc { entries, .. } => entries.iter().map(|e| e.node).collect(),
            Constraint::Spc1 { nodes, .. } => nodes.clone(),
            Constraint::Mpc { terms, .. } => terms.iter().map(|t| t.node).collect(),
            Constraint::SpcAdd { .. } | Constraint::MpcAdd { .. } => Vec::new(),
        }
    }

    pub fn spc_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(8)?;
        let sid = card.id(1, "sid")?;
        let mut entries = vec![SpcEntry {
            node: card.id(2, "g1")?,
            components: card.components(3, "c1")?,
            enforced: card.real_or_blank(4, "d1", 0.0)?,
        }];
        if let Some(node) = card.id_or_blank(5, "g2")? {
            entries.push(SpcEntry {
                node,
                components: card.components(6, "c2")?,
                enforced: card.real_or_blank(7, "d2", 0.0)?,
            });
        }
        Ok(vec![Constraint::Spc { sid, entries }])
    }

    pub fn spc1_from_card(card: &Card) -> Result<Vec<Self>> {
        let nodes = card.ids_with_thru(3, "g")?;
        if nodes.is_empty() {
            return Err(card.validation("SPC1 lists no nodes").into());
        }
        Ok(vec![Constraint::Spc1 {
            sid: card.id(1, "sid")?,
            components: card.components(2, "c")?,
            nodes,
        }])
    }

    pub fn mpc_from_card(card: &Card) -> Result<Vec<Self>> {
        let sid = card.id(1, "sid")?;
        let mut terms = Vec::new();
        let rows = card.nfields().saturating_sub(2) / 8 + 1;
        for row in 0..rows {
            for first in [8 * row + 2, 8 * row + 5] {
                let Some(node) = card.id_or_blank(first, "g")? else {
                    continue;
                };
                terms.push(MpcTerm {
                    node,
                    component: card.components_or_blank(first + 1, "c")?.unwrap_or_else(|| "0".to_string()),
                    coefficient: card.real(first + 2, "a")?,
                });
            }
        }
        if terms.is_empty() {
            return Err(card.validation("MPC has no terms").into());
        }
        Ok(vec![Constraint::Mpc { sid, terms }])
    }

    pub fn spcadd_from_card(card: &Card) -> Result<Vec<Self>> {
        let (sid, sets) = set_union(card)?;
        Ok(vec![Constraint::SpcAdd { sid, sets }])
    }

    pub fn mpcadd_from_card(card: &Card) -> Result<Vec<Self>> {
        let (sid, sets) = set_union(card)?;
        Ok(vec![Constraint::MpcAdd { sid, sets }])
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec![self.card_name().into(), self.sid().into()];
        match self {
            Constraint::Spc { entries, .. } => {
                for e in entries {
                    f.extend([e.node.into(), e.components.as_str().into(), e.enforced.into()]);
                }
            }
            Constraint::Spc1 {
                components, nodes, ..
            } => {
                f.push(components.as_str().into());
                f.extend(id_list(nodes));
            }
            Constraint::Mpc { terms, .. } => {
                for (k, t) in terms.iter().enumerate() {
                    // last field of this row, first field of the next
                    if k % 2 == 0 && k > 0 {
                        f.extend([FieldValue::Blank, FieldValue::Blank]);
                    }
                    f.extend([t.node.into(), t.component.as_str().into(), t.coefficient.into()]);
                }
            }
            Constraint::SpcAdd { sets, .. } | Constraint::MpcAdd { sets, .. } => {
                f.extend(sets.iter().map(|&s| FieldValue::from(s)));
            }
        }
        f
    }
}

fn set_union(card: &Card) -> Result<(i32, Vec<i32>)> {
    let sid = card.id(1, "sid")?;
    let sets = card.ids_with_thru(2, "s")?;
    if sets.is_empty() {
        return Err(card.validation("no member sets").into());
    }
    if sets.contains(&sid) {
        return Err(card.validation(format!("set {sid} lists itself")).into());
    }
    Ok((sid, sets))
}

/// Leaf set ids reachable from `sid` through an aggregator map.
///
/// `sid` itself is returned when it is not an aggregator. Sets already on
/// the path are skipped, so cyclic definitions terminate.
pub fn resolve_union(sid: i32, unions: &BTreeMap<i32, Vec<i32>>) -> BTreeSet<i32> {
    let mut leaves = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![sid];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        match unions.get(&current) {
            Some(members) => stack.extend(members.iter().rev()),
            None => {
                leaves.insert(current);
            }
        }
    }
    leaves
}

//! Static loads: point forces and moments and pressures.
//!
//! Records are grouped by load set id (SID); several cards with the same SID
//! accumulate into one load case.

use bdf_inp::{Card, FieldValue};

use crate::error::Result;
use crate::mesh::nonzero;

/// Whether a point load is a force or a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLoadKind {
    Force,
    Moment,
}

/// A concentrated load on a node (FORCE, MOMENT)
#[derive(Debug, Clone, PartialEq)]
pub struct PointLoad {
    pub kind: PointLoadKind,
    /// Load set ID
    pub sid: i32,
    /// Node ID
    pub node: i32,
    /// Coordinate system of the direction
    pub cid: i32,
    /// Scale factor
    pub scale: f64,
    /// Direction components in `cid`
    pub direction: [f64; 3],
}

impl PointLoad {
    /// Load vector in the `cid` system
    pub fn vector(&self) -> [f64; 3] {
        self.direction.map(|c| self.scale * c)
    }
}

/// Pressure on a 3 or 4 node polygon (PLOAD)
#[derive(Debug, Clone, PartialEq)]
pub struct Pload {
    pub sid: i32,
    pub pressure: f64,
    pub nodes: Vec<i32>,
}

/// Uniform pressure on shell elements (PLOAD2)
#[derive(Debug, Clone, PartialEq)]
pub struct Pload2 {
    pub sid: i32,
    pub pressure: f64,
    pub elements: Vec<i32>,
}

/// A load record.
#[derive(Debug, Clone, PartialEq)]
pub enum Load {
    Point(PointLoad),
    Pload(Pload),
    Pload2(Pload2),
}

impl Load {
    pub fn sid(&self) -> i32 {
        match self {
            Load::Point(l) => l.sid,
            Load::Pload(l) => l.sid,
            Load::Pload2(l) => l.sid,
        }
    }

    pub fn card_name(&self) -> &'static str {
        match self {
            Load::Point(l) if l.kind == PointLoadKind::Force => "FORCE",
            Load::Point(_) => "MOMENT",
            Load::Pload(_) => "PLOAD",
            Load::Pload2(_) => "PLOAD2",
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.card_name(), self.sid())
    }

    /// FORCE/MOMENT: `SID G CID F N1 N2 N3`
    pub fn point_from_card(card: &Card, kind: PointLoadKind) -> Result<Vec<Self>> {
        card.check_max_fields(8)?;
        Ok(vec![Load::Point(PointLoad {
            kind,
            sid: card.id(1, "sid")?,
            node: card.id(2, "g")?,
            cid: card.id_or_blank(3, "cid")?.unwrap_or(0),
            scale: card.real_or_blank(4, "f", 0.0)?,
            direction: [
                card.real_or_blank(5, "n1", 0.0)?,
                card.real_or_blank(6, "n2", 0.0)?,
                card.real_or_blank(7, "n3", 0.0)?,
            ],
        })])
    }

    pub fn force_from_card(card: &Card) -> Result<Vec<Self>> {
        Self::point_from_card(card, PointLoadKind::Force)
    }

    pub fn moment_from_card(card: &Card) -> Result<Vec<Self>> {
        Self::point_from_card(card, PointLoadKind::Moment)
    }

    /// PLOAD: `SID P G1 G2 G3 G4`
    pub fn pload_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(7)?;
        let mut nodes = vec![card.id(3, "g1")?, card.id(4, "g2")?, card.id(5, "g3")?];
        if let Some(g4) = card.id_or_blank(6, "g4")? {
            nodes.push(g4);
        }
        Ok(vec![Load::Pload(Pload {
            sid: card.id(1, "sid")?,
            pressure: card.real(2, "p")?,
            nodes,
        })])
    }

    /// PLOAD2: `SID P EID1 EID2 ...` or `SID P EID1 THRU EID2`
    pub fn pload2_from_card(card: &Card) -> Result<Vec<Self>> {
        let elements = card.ids_with_thru(3, "eid")?;
        if elements.is_empty() {
            return Err(card.validation("PLOAD2 lists no elements").into());
        }
        Ok(vec![Load::Pload2(Pload2 {
            sid: card.id(1, "sid")?,
            pressure: card.real(2, "p")?,
            elements,
        })])
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec![self.card_name().into(), self.sid().into()];
        match self {
            Load::Point(l) => {
                f.extend([l.node.into(), nonzero(l.cid), l.scale.into()]);
                f.extend(l.direction.map(FieldValue::from));
            }
            Load::Pload(l) => {
                f.push(l.pressure.into());
                f.extend(l.nodes.iter().map(|&n| FieldValue::from(n)));
            }
            Load::Pload2(l) => {
                f.push(l.pressure.into());
                f.extend(id_list(&l.elements));
            }
        }
        f
    }
}

/// Ids as written on a card, collapsed to `A THRU B` when they form one
/// ascending run of three or more.
pub(crate) fn id_list(ids: &[i32]) -> Vec<FieldValue> {
    let single_run = ids.len() > 2 && ids.windows(2).all(|w| w[0].checked_add(1) == Some(w[1]));
    match (single_run, ids.first(), ids.last()) {
        (true, Some(&first), Some(&last)) => vec![first.into(), "THRU".into(), last.into()],
        _ => ids.iter().map(|&id| FieldValue::from(id)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_defaults_to_basic_system() {
        let card = Card::from_fields(&["FORCE", "3", "10", "", "100.", "0.", "0.", "1."]);
        let loads = Load::force_from_card(&card).unwrap();
        let Load::Point(force) = &loads[0] else {
            panic!("expected a point load")
        };
        assert_eq!(force.cid, 0);
        assert_eq!(force.vector(), [0.0, 0.0, 100.0]);
        assert_eq!(loads[0].card_name(), "FORCE");
        assert!(loads[0].raw_fields()[3].is_blank());
    }

    #[test]
    fn pload_takes_three_or_four_nodes() {
        let tri = Card::from_fields(&["PLOAD", "1", "-2.", "1", "2", "3"]);
        let Load::Pload(p) = &Load::pload_from_card(&tri).unwrap()[0] else {
            panic!("expected PLOAD")
        };
        assert_eq!(p.nodes, vec![1, 2, 3]);

        let short = Card::from_fields(&["PLOAD", "1", "-2.", "1", "2"]);
        assert!(Load::pload_from_card(&short).is_err());
    }

    #[test]
    fn pload2_expands_and_collapses_thru() {
        let card = Card::from_fields(&["PLOAD2", "4", "5.", "11", "THRU", "15"]);
        let loads = Load::pload2_from_card(&card).unwrap();
        let Load::Pload2(p) = &loads[0] else {
            panic!("expected PLOAD2")
        };
        assert_eq!(p.elements, vec![11, 12, 13, 14, 15]);
        let fields = loads[0].raw_fields();
        assert_eq!(
            fields[3..].to_vec(),
            vec![FieldValue::from(11), FieldValue::from("THRU"), FieldValue::from(15)]
        );
    }

    #[test]
    fn scattered_ids_are_listed() {
        assert_eq!(
            id_list(&[1, 2, 7]),
            vec![FieldValue::from(1), FieldValue::from(2), FieldValue::from(7)]
        );
        assert_eq!(id_list(&[4, 5]).len(), 2);
    }

    #[test]
    fn id_lists_reaching_the_largest_id() {
        let max = i32::MAX;
        assert_eq!(
            id_list(&[max - 2, max - 1, max]),
            vec![FieldValue::from(max - 2), FieldValue::from("THRU"), FieldValue::from(max)]
        );
        assert_eq!(id_list(&[1, max, 3]).len(), 3);
        assert_eq!(id_list(&[max, max, max]).len(), 3);
    }
}

//! Grid points and elements.
//!
//! Every element keeps the fields needed to write its card back, even those
//! no derived quantity uses.

use bdf_inp::{Card, FieldValue};

use crate::error::Result;

/// A grid point (GRID).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node ID
    pub id: i32,
    /// Coordinate system of `xyz`
    pub cp: i32,
    /// Position in the CP system
    pub xyz: [f64; 3],
    /// Output coordinate system
    pub cd: i32,
    /// Permanent single-point constraints
    pub ps: Option<String>,
    /// Superelement id
    pub seid: i32,
}

impl Node {
    /// Create a node in the basic system
    pub fn new(id: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            cp: 0,
            xyz: [x, y, z],
            cd: 0,
            ps: None,
            seid: 0,
        }
    }

    /// GRID: `ID CP X1 X2 X3 CD PS SEID`
    pub fn from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(9)?;
        Ok(Self {
            id: card.id(1, "nid")?,
            cp: card.id_or_blank(2, "cp")?.unwrap_or(0),
            xyz: [
                card.real_or_blank(3, "x1", 0.0)?,
                card.real_or_blank(4, "x2", 0.0)?,
                card.real_or_blank(5, "x3", 0.0)?,
            ],
            cd: card.id_or_blank(6, "cd")?.unwrap_or(0),
            ps: card.components_or_blank(7, "ps")?,
            seid: card.id_or_blank(8, "seid")?.unwrap_or(0),
        })
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        vec![
            "GRID".into(),
            self.id.into(),
            nonzero(self.cp),
            self.xyz[0].into(),
            self.xyz[1].into(),
            self.xyz[2].into(),
            nonzero(self.cd),
            self.ps.clone().into(),
            nonzero(self.seid),
        ]
    }
}

/// Blank for a zero id, the id otherwise.
pub(crate) fn nonzero(id: i32) -> FieldValue {
    if id == 0 { FieldValue::Blank } else { id.into() }
}

/// Element family; decides which properties an element accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementFamily {
    Line,
    Shell,
    Solid,
    Spring,
    Mass,
}

/// Element type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Crod,
    Conrod,
    Ctube,
    Cbar,
    Cbeam,
    Ctria3,
    Ctria6,
    Cquad4,
    Cquad8,
    Ctetra,
    Cpenta,
    Chexa,
    Celas1,
    Celas2,
    Conm2,
}

impl ElementType {
    pub fn card_name(self) -> &'static str {
        match self {
            ElementType::Crod => "CROD",
            ElementType::Conrod => "CONROD",
            ElementType::Ctube => "CTUBE",
            ElementType::Cbar => "CBAR",
            ElementType::Cbeam => "CBEAM",
            ElementType::Ctria3 => "CTRIA3",
            ElementType::Ctria6 => "CTRIA6",
            ElementType::Cquad4 => "CQUAD4",
            ElementType::Cquad8 => "CQUAD8",
            ElementType::Ctetra => "CTETRA",
            ElementType::Cpenta => "CPENTA",
            ElementType::Chexa => "CHEXA",
            ElementType::Celas1 => "CELAS1",
            ElementType::Celas2 => "CELAS2",
            ElementType::Conm2 => "CONM2",
        }
    }

    pub fn family(self) -> ElementFamily {
        match self {
            ElementType::Crod
            | ElementType::Conrod
            | ElementType::Ctube
            | ElementType::Cbar
            | ElementType::Cbeam => ElementFamily::Line,
            ElementType::Ctria3 | ElementType::Ctria6 | ElementType::Cquad4 | ElementType::Cquad8 => {
                ElementFamily::Shell
            }
            ElementType::Ctetra | ElementType::Cpenta | ElementType::Chexa => ElementFamily::Solid,
            ElementType::Celas1 | ElementType::Celas2 => ElementFamily::Spring,
            ElementType::Conm2 => ElementFamily::Mass,
        }
    }

    /// Number of corner nodes used for geometry
    pub fn corner_nodes(self) -> usize {
        match self {
            ElementType::Crod
            | ElementType::Conrod
            | ElementType::Ctube
            | ElementType::Cbar
            | ElementType::Cbeam
            | ElementType::Celas1
            | ElementType::Celas2 => 2,
            ElementType::Ctria3 | ElementType::Ctria6 => 3,
            ElementType::Cquad4 | ElementType::Cquad8 | ElementType::Ctetra => 4,
            ElementType::Cpenta => 6,
            ElementType::Chexa => 8,
            ElementType::Conm2 => 1,
        }
    }

    /// Node counts the card accepts (linear and with mid-side nodes)
    pub fn node_counts(self) -> (usize, usize) {
        match self {
            ElementType::Ctetra => (4, 10),
            ElementType::Cpenta => (6, 15),
            ElementType::Chexa => (8, 20),
            ElementType::Ctria6 => (3, 6),
            ElementType::Cquad8 => (4, 8),
            other => (other.corner_nodes(), other.corner_nodes()),
        }
    }
}

/// CBAR/CBEAM orientation: a vector or a third node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Vector([f64; 3]),
    Node(i32),
}

/// Shell material orientation: an angle or a coordinate system id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThetaMcid {
    Theta(f64),
    Mcid(i32),
}

/// Family-specific element data.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementData {
    /// CROD, CTUBE and solids.
    None,
    Conrod {
        mid: i32,
        a: f64,
        j: f64,
        c: f64,
        nsm: f64,
    },
    Bar {
        orientation: Orientation,
        /// OFFT for CBAR, OFFT or BIT for CBEAM
        offt: Option<String>,
        bit: Option<f64>,
        pa: Option<String>,
        pb: Option<String>,
        wa: [f64; 3],
        wb: [f64; 3],
        /// Scalar points of warping DOF, CBEAM only
        sa: Option<i32>,
        sb: Option<i32>,
    },
    Shell {
        theta_mcid: ThetaMcid,
        zoffs: Option<f64>,
        /// 1 when the corner thicknesses are relative to the property T
        tflag: i64,
        thickness: [Option<f64>; 4],
    },
    Spring1 {
        c1: Option<String>,
        c2: Option<String>,
    },
    Spring2 {
        k: f64,
        c1: Option<String>,
        c2: Option<String>,
        ge: f64,
        s: f64,
    },
    Mass {
        cid: i32,
        mass: f64,
        offset: [f64; 3],
        /// I11, I21, I22, I31, I32, I33
        inertia: [f64; 6],
    },
}

/// An element record.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: i32,
    pub element_type: ElementType,
    /// Property id; `None` for CONROD, CELAS2 and CONM2
    pub pid: Option<i32>,
    /// Node ids in card order; optional nodes may be blank
    pub nodes: Vec<Option<i32>>,
    pub data: ElementData,
}

impl Element {
    /// Non-blank node ids
    pub fn node_ids(&self) -> Vec<i32> {
        self.nodes.iter().flatten().copied().collect()
    }

    /// Corner node ids, `None` when a corner is blank
    pub fn corner_ids(&self) -> Option<Vec<i32>> {
        self.nodes
            .iter()
            .take(self.element_type.corner_nodes())
            .copied()
            .collect()
    }

    /// Split a CQUAD4 along its G1-G3 diagonal into the CTRIA3 pair
    /// `(G1 G2 G3)`, keeping this id, and `(G1 G3 G4)` numbered
    /// `second_id`. `None` for every other element type.
    pub fn split_quad(&self, second_id: i32) -> Option<[Element; 2]> {
        let ElementData::Shell {
            theta_mcid,
            zoffs,
            tflag,
            thickness: [t1, t2, t3, t4],
        } = self.data
        else {
            return None;
        };
        if self.element_type != ElementType::Cquad4 {
            return None;
        }
        let corner = |k: usize| self.nodes.get(k).copied().flatten();
        let tria = |id: i32, corners: [usize; 3], t: [Option<f64>; 3]| Element {
            id,
            element_type: ElementType::Ctria3,
            pid: self.pid,
            nodes: corners.iter().map(|&k| corner(k)).collect(),
            data: ElementData::Shell {
                theta_mcid,
                zoffs,
                tflag,
                thickness: [t[0], t[1], t[2], None],
            },
        };
        Some([
            tria(self.id, [0, 1, 2], [t1, t2, t3]),
            tria(second_id, [0, 2, 3], [t1, t3, t4]),
        ])
    }

    /// Label used in messages, e.g. `CBAR 10`
    pub fn label(&self) -> String {
        format!("{} {}", self.element_type.card_name(), self.id)
    }

    /// CROD/CTUBE: `EID PID G1 G2`
    pub fn rod_from_card(card: &Card, element_type: ElementType) -> Result<Self> {
        card.check_max_fields(5)?;
        let id = card.id(1, "eid")?;
        Ok(Self {
            id,
            element_type,
            pid: Some(card.id_or_blank(2, "pid")?.unwrap_or(id)),
            nodes: vec![Some(card.id(3, "g1")?), Some(card.id(4, "g2")?)],
            data: ElementData::None,
        })
    }

    /// CONROD: `EID G1 G2 MID A J C NSM`
    pub fn conrod_from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(9)?;
        Ok(Self {
            id: card.id(1, "eid")?,
            element_type: ElementType::Conrod,
            pid: None,
            nodes: vec![Some(card.id(2, "g1")?), Some(card.id(3, "g2")?)],
            data: ElementData::Conrod {
                mid: card.id(4, "mid")?,
                a: card.real_or_blank(5, "a", 0.0)?,
                j: card.real_or_blank(6, "j", 0.0)?,
                c: card.real_or_blank(7, "c", 0.0)?,
                nsm: card.real_or_blank(8, "nsm", 0.0)?,
            },
        })
    }

    /// CBAR/CBEAM: `EID PID GA GB X1|G0 X2 X3 OFFT|BIT; PA PB W1A W2A W3A W1B W2B W3B; SA SB`
    pub fn bar_from_card(card: &Card, element_type: ElementType) -> Result<Self> {
        let beam = element_type == ElementType::Cbeam;
        card.check_max_fields(if beam { 19 } else { 17 })?;
        let id = card.id(1, "eid")?;
        let ga = card.id(3, "ga")?;
        let gb = card.id(4, "gb")?;
        if ga == gb {
            return Err(card.validation(format!("GA and GB are both {ga}")).into());
        }

        let orientation = match card.classify(5) {
            FieldValue::Integer(_) => Orientation::Node(card.id(5, "g0")?),
            _ => Orientation::Vector([
                card.real_or_blank(5, "x1", 0.0)?,
                card.real_or_blank(6, "x2", 0.0)?,
                card.real_or_blank(7, "x3", 0.0)?,
            ]),
        };

        let (offt, bit) = match card.classify(8) {
            FieldValue::Real(_) if beam => (None, Some(card.real(8, "bit")?)),
            _ => (card.string_or_blank(8, "offt")?, None),
        };

        let mut wa = [0.0; 3];
        let mut wb = [0.0; 3];
        for k in 0..3 {
            wa[k] = card.real_or_blank(11 + k, "wa", 0.0)?;
            wb[k] = card.real_or_blank(14 + k, "wb", 0.0)?;
        }

        Ok(Self {
            id,
            element_type,
            pid: Some(card.id_or_blank(2, "pid")?.unwrap_or(id)),
            nodes: vec![Some(ga), Some(gb)],
            data: ElementData::Bar {
                orientation,
                offt,
                bit,
                pa: card.components_or_blank(9, "pa")?,
                pb: card.components_or_blank(10, "pb")?,
                wa,
                wb,
                sa: if beam { card.id_or_blank(17, "sa")? } else { None },
                sb: if beam { card.id_or_blank(18, "sb")? } else { None },
            },
        })
    }

    /// CTRIA3/CQUAD4/CTRIA6/CQUAD8.
    pub fn shell_from_card(card: &Card, element_type: ElementType) -> Result<Self> {
        // node count, then field indices of theta, zoffs, tflag, T1, then max fields
        let (nnodes, theta_at, zoffs_at, tflag_at, t_at, max) = match element_type {
            ElementType::Ctria3 => (3, 6, 7, 10, 11, 14),
            ElementType::Cquad4 => (4, 7, 8, 10, 11, 15),
            ElementType::Ctria6 => (6, 9, 10, 14, 11, 15),
            _ => (8, 15, 16, 17, 11, 18),
        };
        let corners = element_type.corner_nodes();
        card.check_max_fields(max)?;
        card.check_min_fields(3 + corners)?;
        let id = card.id(1, "eid")?;

        let mut nodes = Vec::with_capacity(nnodes);
        for k in 0..nnodes {
            let index = 3 + k;
            if k < corners {
                nodes.push(Some(card.id(index, "g")?));
            } else {
                nodes.push(card.id_or_blank(index, "g")?);
            }
        }
        if let Some(corners) = nodes.get(..corners) {
            let mut sorted: Vec<_> = corners.iter().flatten().collect();
            sorted.sort();
            sorted.dedup();
            if sorted.len() != corners.len() {
                return Err(card.validation("corner nodes must be distinct").into());
            }
        }

        let theta_mcid = match card.classify(theta_at) {
            FieldValue::Integer(_) => ThetaMcid::Mcid(card.id(theta_at, "mcid")?),
            _ => ThetaMcid::Theta(card.real_or_blank(theta_at, "theta", 0.0)?),
        };

        let mut thickness = [None; 4];
        for (k, t) in thickness.iter_mut().enumerate().take(corners) {
            *t = card.real_or_none(t_at + k, "t")?;
        }

        Ok(Self {
            id,
            element_type,
            pid: Some(card.id_or_blank(2, "pid")?.unwrap_or(id)),
            nodes,
            data: ElementData::Shell {
                theta_mcid,
                zoffs: card.real_or_none(zoffs_at, "zoffs")?,
                tflag: card.integer_or_blank(tflag_at, "tflag", 0)?,
                thickness,
            },
        })
    }

    /// CTETRA/CPENTA/CHEXA with or without mid-side nodes.
    pub fn solid_from_card(card: &Card, element_type: ElementType) -> Result<Self> {
        let (low, high) = element_type.node_counts();
        card.check_max_fields(3 + high)?;
        card.check_min_fields(3 + low)?;
        let id = card.id(1, "eid")?;
        let has_mid_side = (3 + low..3 + high).any(|i| !card.is_blank(i));
        let count = if has_mid_side { high } else { low };
        let mut nodes = Vec::with_capacity(count);
        for k in 0..count {
            let index = 3 + k;
            if k < low {
                nodes.push(Some(card.id(index, "g")?));
            } else {
                nodes.push(card.id_or_blank(index, "g")?);
            }
        }
        Ok(Self {
            id,
            element_type,
            pid: Some(card.id(2, "pid")?),
            nodes,
            data: ElementData::None,
        })
    }

    /// CELAS1: `EID PID G1 C1 G2 C2`
    pub fn celas1_from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(7)?;
        let id = card.id(1, "eid")?;
        Ok(Self {
            id,
            element_type: ElementType::Celas1,
            pid: Some(card.id_or_blank(2, "pid")?.unwrap_or(id)),
            nodes: vec![card.id_or_blank(3, "g1")?, card.id_or_blank(5, "g2")?],
            data: ElementData::Spring1 {
                c1: card.components_or_blank(4, "c1")?,
                c2: card.components_or_blank(6, "c2")?,
            },
        })
    }

    /// CELAS2: `EID K G1 C1 G2 C2 GE S`
    pub fn celas2_from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(9)?;
        Ok(Self {
            id: card.id(1, "eid")?,
            element_type: ElementType::Celas2,
            pid: None,
            nodes: vec![card.id_or_blank(3, "g1")?, card.id_or_blank(5, "g2")?],
            data: ElementData::Spring2 {
                k: card.real(2, "k")?,
                c1: card.components_or_blank(4, "c1")?,
                c2: card.components_or_blank(6, "c2")?,
                ge: card.real_or_blank(7, "ge", 0.0)?,
                s: card.real_or_blank(8, "s", 0.0)?,
            },
        })
    }

    /// CONM2: `EID G CID M X1 X2 X3 -; I11 I21 I22 I31 I32 I33`
    pub fn conm2_from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(15)?;
        let cid = card.integer_or_blank(3, "cid", 0)?;
        if cid < -1 {
            return Err(card.validation(format!("CID {cid} must be -1 or a system id")).into());
        }
        let mut inertia = [0.0; 6];
        for (k, value) in inertia.iter_mut().enumerate() {
            *value = card.real_or_blank(9 + k, "inertia", 0.0)?;
        }
        Ok(Self {
            id: card.id(1, "eid")?,
            element_type: ElementType::Conm2,
            pid: None,
            nodes: vec![Some(card.id(2, "g")?)],
            data: ElementData::Mass {
                cid: cid as i32,
                mass: card.real_or_blank(4, "mass", 0.0)?,
                offset: [
                    card.real_or_blank(5, "x1", 0.0)?,
                    card.real_or_blank(6, "x2", 0.0)?,
                    card.real_or_blank(7, "x3", 0.0)?,
                ],
                inertia,
            },
        })
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec![self.element_type.card_name().into(), self.id.into()];
        let node = |k: usize| -> FieldValue { self.nodes.get(k).copied().flatten().into() };

        match (&self.data, self.element_type) {
            (ElementData::Conrod { mid, a, j, c, nsm }, _) => {
                f.extend([node(0), node(1), (*mid).into()]);
                f.extend([*a, *j, *c, *nsm].map(FieldValue::from));
            }
            (
                ElementData::Bar {
                    orientation,
                    offt,
                    bit,
                    pa,
                    pb,
                    wa,
                    wb,
                    sa,
                    sb,
                },
                element_type,
            ) => {
                f.extend([self.pid.into(), node(0), node(1)]);
                match orientation {
                    Orientation::Node(g0) => {
                        f.extend([(*g0).into(), FieldValue::Blank, FieldValue::Blank])
                    }
                    Orientation::Vector(x) => f.extend(x.map(FieldValue::from)),
                }
                f.push(match bit {
                    Some(bit) => (*bit).into(),
                    None => offt.clone().into(),
                });
                f.extend([pa.clone().into(), pb.clone().into()]);
                f.extend(wa.iter().chain(wb).map(|v| FieldValue::from(*v)));
                if element_type == ElementType::Cbeam {
                    f.extend([(*sa).into(), (*sb).into()]);
                }
            }
            (
                ElementData::Shell {
                    theta_mcid,
                    zoffs,
                    tflag,
                    thickness,
                },
                element_type,
            ) => {
                f.push(self.pid.into());
                f.extend((0..self.nodes.len()).map(node));
                let theta: FieldValue = match theta_mcid {
                    ThetaMcid::Mcid(mcid) => (*mcid).into(),
                    ThetaMcid::Theta(t) if *t == 0.0 => FieldValue::Blank,
                    ThetaMcid::Theta(t) => (*t).into(),
                };
                let zoffs: FieldValue = (*zoffs).into();
                let tflag: FieldValue = if *tflag == 0 { FieldValue::Blank } else { (*tflag).into() };
                let corners = element_type.corner_nodes();
                let t: Vec<FieldValue> = thickness[..corners].iter().map(|t| (*t).into()).collect();
                match element_type {
                    ElementType::Ctria3 | ElementType::Cquad4 => {
                        f.resize(if corners == 3 { 6 } else { 7 }, FieldValue::Blank);
                        f.extend([theta, zoffs]);
                        f.resize(10, FieldValue::Blank);
                        f.push(tflag);
                        f.extend(t);
                    }
                    ElementType::Ctria6 => {
                        f.resize(9, FieldValue::Blank);
                        f.extend([theta, zoffs]);
                        f.extend(t);
                        f.push(tflag);
                    }
                    _ => {
                        f.resize(11, FieldValue::Blank);
                        f.extend(t);
                        f.extend([theta, zoffs, tflag]);
                    }
                }
            }
            (ElementData::Spring1 { c1, c2 }, _) => {
                f.extend([self.pid.into(), node(0), c1.clone().into(), node(1), c2.clone().into()]);
            }
            (ElementData::Spring2 { k, c1, c2, ge, s }, _) => {
                f.extend([
                    (*k).into(),
                    node(0),
                    c1.clone().into(),
                    node(1),
                    c2.clone().into(),
                    (*ge).into(),
                    (*s).into(),
                ]);
            }
            (
                ElementData::Mass {
                    cid,
                    mass,
                    offset,
                    inertia,
                },
                _,
            ) => {
                f.extend([node(0), nonzero(*cid), (*mass).into()]);
                f.extend(offset.map(FieldValue::from));
                f.push(FieldValue::Blank);
                f.extend(inertia.map(FieldValue::from));
            }
            (ElementData::None, _) => {
                f.push(self.pid.into());
                f.extend((0..self.nodes.len()).map(node));
            }
        }
        f
    }
}

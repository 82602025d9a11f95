//! Coordinate systems (CORD1R/C/S, CORD2R/C/S) and resolved frames.
//!
//! Local coordinates are (x, y, z) for rectangular systems, (R, θ, Z) for
//! cylindrical and (R, θ, φ) for spherical ones, angles in degrees.

use bdf_inp::{Card, FieldValue};
use nalgebra::{Matrix3, Vector3};

use crate::error::{ModelError, Result};

/// Id of the implicit basic system.
pub const BASIC: i32 = 0;

/// Coordinate system kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordKind {
    Rectangular,
    Cylindrical,
    Spherical,
}

impl CoordKind {
    /// Trailing letter of the card name.
    pub fn letter(self) -> char {
        match self {
            CoordKind::Rectangular => 'R',
            CoordKind::Cylindrical => 'C',
            CoordKind::Spherical => 'S',
        }
    }

    fn from_card_name(name: &str) -> Option<Self> {
        match name.chars().last()? {
            'R' => Some(CoordKind::Rectangular),
            'C' => Some(CoordKind::Cylindrical),
            'S' => Some(CoordKind::Spherical),
            _ => None,
        }
    }
}

/// How a coordinate system is defined.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordDef {
    /// Three node ids: origin, a point on the z axis, a point in the xz plane.
    Nodes { g1: i32, g2: i32, g3: i32 },
    /// Three points A, B, C given in the `rid` system.
    Points {
        rid: i32,
        a: [f64; 3],
        b: [f64; 3],
        c: [f64; 3],
    },
}

/// A coordinate system record.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordSystem {
    pub id: i32,
    pub kind: CoordKind,
    pub def: CoordDef,
}

impl CoordSystem {
    /// The basic rectangular system, id 0.
    pub fn basic() -> Self {
        Self {
            id: BASIC,
            kind: CoordKind::Rectangular,
            def: CoordDef::Points {
                rid: BASIC,
                a: [0.0, 0.0, 0.0],
                b: [0.0, 0.0, 1.0],
                c: [1.0, 0.0, 0.0],
            },
        }
    }

    pub fn card_name(&self) -> String {
        let prefix = match self.def {
            CoordDef::Nodes { .. } => "CORD1",
            CoordDef::Points { .. } => "CORD2",
        };
        format!("{prefix}{}", self.kind.letter())
    }

    /// Reference system id, `None` for node-defined systems.
    pub fn rid(&self) -> Option<i32> {
        match self.def {
            CoordDef::Points { rid, .. } => Some(rid),
            CoordDef::Nodes { .. } => None,
        }
    }

    /// CORD2R/C/S: `CID RID A1 A2 A3 B1 B2 B3 C1 C2 C3`.
    pub fn from_cord2(card: &Card) -> Result<Self> {
        card.check_max_fields(12)?;
        let kind = CoordKind::from_card_name(&card.name)
            .ok_or_else(|| card.validation("unknown coordinate system kind"))?;
        let id = card.id(1, "cid")?;
        let rid = card.id_or_blank(2, "rid")?.unwrap_or(BASIC);
        let mut points = [[0.0; 3]; 3];
        for (p, point) in points.iter_mut().enumerate() {
            for (k, value) in point.iter_mut().enumerate() {
                let index = 3 + 3 * p + k;
                let name = format!("{}{}", ['a', 'b', 'c'][p], k + 1);
                *value = card.real_or_blank(index, &name, 0.0)?;
            }
        }
        Ok(Self {
            id,
            kind,
            def: CoordDef::Points {
                rid,
                a: points[0],
                b: points[1],
                c: points[2],
            },
        })
    }

    /// CORD1R/C/S: one or two systems, `CID G1 G2 G3` per group of four.
    pub fn from_cord1(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(9)?;
        let kind = CoordKind::from_card_name(&card.name)
            .ok_or_else(|| card.validation("unknown coordinate system kind"))?;
        let mut systems = Vec::with_capacity(2);
        for base in [1usize, 5] {
            if base > 1 && (base..base + 4).all(|i| card.is_blank(i)) {
                break;
            }
            let id = card.id(base, "cid")?;
            let g1 = card.id(base + 1, "g1")?;
            let g2 = card.id(base + 2, "g2")?;
            let g3 = card.id(base + 3, "g3")?;
            if g1 == g2 || g2 == g3 || g1 == g3 {
                return Err(card
                    .validation(format!("CORD1 {id} nodes {g1}, {g2}, {g3} must be distinct"))
                    .into());
            }
            systems.push(Self {
                id,
                kind,
                def: CoordDef::Nodes { g1, g2, g3 },
            });
        }
        Ok(systems)
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut fields: Vec<FieldValue> = vec![self.card_name().into(), self.id.into()];
        match &self.def {
            CoordDef::Nodes { g1, g2, g3 } => {
                fields.extend([(*g1).into(), (*g2).into(), (*g3).into()]);
            }
            CoordDef::Points { rid, a, b, c } => {
                fields.push(if *rid == BASIC { FieldValue::Blank } else { (*rid).into() });
                fields.extend(a.iter().chain(b).chain(c).map(|v| FieldValue::from(*v)));
            }
        }
        fields
    }
}

/// A coordinate system resolved into the basic frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub kind: CoordKind,
    /// Origin in basic coordinates.
    pub origin: Vector3<f64>,
    /// Columns are the local unit axes i, j, k in basic coordinates.
    pub axes: Matrix3<f64>,
}

impl Frame {
    pub fn basic() -> Self {
        Self {
            kind: CoordKind::Rectangular,
            origin: Vector3::zeros(),
            axes: Matrix3::identity(),
        }
    }

    /// Build a frame from origin `a`, z-axis point `b` and xz-plane point `c`,
    /// all in basic coordinates.
    pub fn from_points(
        kind: CoordKind,
        a: Vector3<f64>,
        b: Vector3<f64>,
        c: Vector3<f64>,
        entity: &str,
    ) -> Result<Self> {
        let z = b - a;
        let in_plane = c - a;
        let y = z.cross(&in_plane);
        if z.norm() <= f64::EPSILON || y.norm() <= f64::EPSILON * z.norm() * in_plane.norm() {
            return Err(ModelError::degenerate(entity, "defining points are collinear"));
        }
        let k = z.normalize();
        let j = y.normalize();
        let i = j.cross(&k);
        Ok(Self {
            kind,
            origin: a,
            axes: Matrix3::from_columns(&[i, j, k]),
        })
    }

    /// Local coordinates to rectangular coordinates of the same frame.
    pub fn local_to_rectangular(&self, local: Vector3<f64>) -> Vector3<f64> {
        match self.kind {
            CoordKind::Rectangular => local,
            CoordKind::Cylindrical => {
                let (r, theta, z) = (local.x, local.y.to_radians(), local.z);
                Vector3::new(r * theta.cos(), r * theta.sin(), z)
            }
            CoordKind::Spherical => {
                let (r, theta, phi) = (local.x, local.y.to_radians(), local.z.to_radians());
                Vector3::new(
                    r * theta.sin() * phi.cos(),
                    r * theta.sin() * phi.sin(),
                    r * theta.cos(),
                )
            }
        }
    }

    /// Position given in this frame to basic coordinates.
    pub fn to_basic(&self, local: Vector3<f64>) -> Vector3<f64> {
        self.origin + self.axes * self.local_to_rectangular(local)
    }

    /// Direction components given in this frame to a basic vector.
    ///
    /// Curvilinear components are taken along the local unit vectors at
    /// `at`, a point in basic coordinates.
    pub fn direction_to_basic(&self, components: Vector3<f64>, at: Vector3<f64>) -> Vector3<f64> {
        let rect = self.axes.transpose() * (at - self.origin);
        let local_basis = match self.kind {
            CoordKind::Rectangular => Matrix3::identity(),
            CoordKind::Cylindrical => {
                let theta = rect.y.atan2(rect.x);
                let (s, c) = theta.sin_cos();
                Matrix3::from_columns(&[
                    Vector3::new(c, s, 0.0),
                    Vector3::new(-s, c, 0.0),
                    Vector3::z(),
                ])
            }
            CoordKind::Spherical => {
                let r = rect.norm();
                let theta = if r > 0.0 { (rect.z / r).clamp(-1.0, 1.0).acos() } else { 0.0 };
                let phi = rect.y.atan2(rect.x);
                let (st, ct) = theta.sin_cos();
                let (sp, cp) = phi.sin_cos();
                Matrix3::from_columns(&[
                    Vector3::new(st * cp, st * sp, ct),
                    Vector3::new(ct * cp, ct * sp, -st),
                    Vector3::new(-sp, cp, 0.0),
                ])
            }
        };
        self.axes * local_basis * components
    }
}

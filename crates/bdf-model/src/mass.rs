//! Mass properties, breakdowns and load resultants.
//!
//! Elements contribute as point masses at their centroids (beams at the
//! centroid of their mass distribution). CONM2 adds its own inertia
//! tensor. All quantities are in the basic system.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::coords::Frame;
use crate::error::{Category, ModelError, Result};
use crate::geometry::polygon_area_normal;
use crate::loads::{Load, PointLoadKind};
use crate::materials::Material;
use crate::mesh::{Element, ElementData, ElementFamily};
use crate::model::BdfModel;
use crate::properties::{PBeam, Property};

/// Selection and reference point for [`BdfModel::mass_properties`].
#[derive(Debug, Clone, Default)]
pub struct MassQuery {
    element_ids: Option<BTreeSet<i32>>,
    property_ids: Option<BTreeSet<i32>>,
    reference_point: [f64; 3],
}

impl MassQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only these elements.
    pub fn element_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.element_ids = Some(ids.into_iter().collect());
        self
    }

    /// Only elements with these properties; elements without a property
    /// (CONROD, CELAS2, CONM2) are then excluded.
    pub fn property_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.property_ids = Some(ids.into_iter().collect());
        self
    }

    /// Point the inertia tensor is taken about.
    pub fn reference_point(mut self, point: [f64; 3]) -> Self {
        self.reference_point = point;
        self
    }

    fn selects(&self, element: &Element) -> bool {
        let by_element = self
            .element_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&element.id));
        let by_property = match (&self.property_ids, element.pid) {
            (None, _) => true,
            (Some(ids), Some(pid)) => ids.contains(&pid),
            (Some(_), None) => false,
        };
        by_element && by_property
    }
}

/// Mass, center of gravity and inertia tensor about the query's reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub cg: Vector3<f64>,
    pub inertia: Matrix3<f64>,
}

/// One element's contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MassPoint {
    mass: f64,
    cg: Vector3<f64>,
    /// Inertia about `cg`
    inertia: Matrix3<f64>,
}

impl MassPoint {
    fn point(mass: f64, cg: Vector3<f64>) -> Self {
        Self {
            mass,
            cg,
            inertia: Matrix3::zeros(),
        }
    }
}

/// Inertia of a point mass `mass` at offset `d` from the reference point.
fn parallel_axis(mass: f64, d: Vector3<f64>) -> Matrix3<f64> {
    mass * (Matrix3::identity() * d.norm_squared() - d * d.transpose())
}

/// Mass per unit length and its first moment over a linearly varying
/// profile of `(x, mass per length)` points on `[0, 1]`.
fn integrate_profile(profile: &[(f64, f64)]) -> (f64, f64) {
    profile
        .windows(2)
        .map(|w| {
            let ((x1, m1), (x2, m2)) = (w[0], w[1]);
            let dx = x2 - x1;
            let mass = dx * (m1 + m2) / 2.0;
            let moment = dx * (m1 * (2.0 * x1 + x2) + m2 * (x1 + 2.0 * x2)) / 6.0;
            (mass, moment)
        })
        .fold((0.0, 0.0), |(m, s), (dm, ds)| (m + dm, s + ds))
}

impl BdfModel {
    fn material_for(&self, mid: i32, referrer: &str, field: &str) -> Result<&Material> {
        self.material(mid)
            .ok_or_else(|| ModelError::dangling(referrer, field, Category::Material, mid))
    }

    fn property_for(&self, element: &Element) -> Result<&Property> {
        let label = element.label();
        let pid = element
            .pid
            .ok_or_else(|| ModelError::degenerate(&label, "has no property"))?;
        let property = self
            .property(pid)
            .ok_or_else(|| ModelError::dangling(&label, "pid", Category::Property, pid))?;
        if !property.accepts(element.element_type) {
            return Err(ModelError::PropertyMismatch {
                element: element.id,
                element_type: element.element_type.card_name().to_string(),
                property: pid,
                property_type: property.card_name().to_string(),
            });
        }
        Ok(property)
    }

    /// Mass of one element.
    pub fn element_mass(&self, eid: i32) -> Result<f64> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        let element = self
            .element(eid)
            .ok_or_else(|| ModelError::dangling("mass query", "eid", Category::Element, eid))?;
        Ok(self.mass_point(element)?.mass)
    }

    fn mass_point(&self, element: &Element) -> Result<MassPoint> {
        let label = element.label();
        match (&element.data, element.element_type.family()) {
            (ElementData::Conrod { mid, a, nsm, .. }, _) => {
                let rho = self.material_for(*mid, &label, "mid")?.rho();
                let length = self.length_of(element)?;
                Ok(MassPoint::point(length * (rho * a + nsm), self.centroid_of(element)?))
            }
            (ElementData::Mass { .. }, _) => self.conm2_mass(element),
            (_, ElementFamily::Spring) => Ok(MassPoint::point(0.0, Vector3::zeros())),
            (_, ElementFamily::Line) => self.line_mass(element),
            (_, ElementFamily::Shell) => {
                let (area, _) = self.area_normal_of(element)?;
                let per_area = self.shell_mass_per_area(element)?;
                Ok(MassPoint::point(area * per_area, self.centroid_of(element)?))
            }
            (_, ElementFamily::Solid) => {
                let rho = match self.property_for(element)? {
                    Property::Solid(p) => self.material_for(p.mid, &label, "mid")?.rho(),
                    _ => 0.0,
                };
                let (volume, centroid) = self.volume_centroid_of(element)?;
                Ok(MassPoint::point(rho * volume, centroid))
            }
            (_, ElementFamily::Mass) => Ok(MassPoint::point(0.0, Vector3::zeros())),
        }
    }

    fn line_mass(&self, element: &Element) -> Result<MassPoint> {
        let property = self.property_for(element)?;
        let label = property.label();
        let length = self.length_of(element)?;
        let ends = self.corner_positions(element)?;
        let midpoint = (ends[0] + ends[1]) / 2.0;
        let per_length = |rho: f64, area: f64, nsm: f64| rho * area + nsm;
        let mass = match property {
            Property::Rod(p) => {
                let rho = self.material_for(p.mid, &label, "mid")?.rho();
                per_length(rho, p.a, p.nsm)
            }
            Property::Tube(p) => {
                let rho = self.material_for(p.mid, &label, "mid")?.rho();
                per_length(rho, p.area(), p.nsm)
            }
            Property::Bar(p) => {
                let rho = self.material_for(p.mid, &label, "mid")?.rho();
                per_length(rho, p.a, p.nsm)
            }
            Property::Beam(p) => {
                let rho = self.material_for(p.mid, &label, "mid")?.rho();
                let (mass, moment) = beam_mass(p, rho);
                let s = if mass != 0.0 { moment / mass } else { 0.5 };
                return Ok(MassPoint::point(
                    length * mass,
                    ends[0] + s * (ends[1] - ends[0]),
                ));
            }
            _ => 0.0,
        };
        Ok(MassPoint::point(length * mass, midpoint))
    }

    fn shell_mass_per_area(&self, element: &Element) -> Result<f64> {
        let property = self.property_for(element)?;
        let label = property.label();
        match property {
            Property::Shell(p) => {
                let rho = match (p.mid1, p.mid2) {
                    (Some(mid), _) => self.material_for(mid, &label, "mid1")?.rho(),
                    (None, Some(mid)) => self.material_for(mid, &label, "mid2")?.rho(),
                    (None, None) => 0.0,
                };
                let t = shell_thickness(element, p.t.unwrap_or(0.0));
                Ok(rho * t + p.nsm)
            }
            Property::Composite(p) => {
                let mut per_area = 0.0;
                for (k, ply) in p.plies.iter().enumerate() {
                    let rho = self
                        .material_for(ply.mid, &label, &format!("ply {} mid", k + 1))?
                        .rho();
                    per_area += rho * ply.t;
                }
                if p.is_symmetric() {
                    per_area *= 2.0;
                }
                Ok(per_area + p.nsm)
            }
            _ => Ok(0.0),
        }
    }

    fn conm2_mass(&self, element: &Element) -> Result<MassPoint> {
        let label = element.label();
        let ElementData::Mass {
            cid,
            mass,
            offset,
            inertia,
        } = &element.data
        else {
            return Ok(MassPoint::point(0.0, Vector3::zeros()));
        };
        let x = Vector3::from(*offset);
        let [i11, i21, i22, i31, i32, i33] = *inertia;
        let tensor = Matrix3::new(i11, -i21, -i31, -i21, i22, -i32, -i31, -i32, i33);

        let (cg, tensor) = match *cid {
            -1 => (x, tensor),
            0 => {
                let node = self.corner_positions(element)?[0];
                (node + x, tensor)
            }
            cid => {
                let node = self.corner_positions(element)?[0];
                let frame: Frame = self
                    .frame(cid)
                    .map_err(|_| ModelError::dangling(&label, "cid", Category::Coord, cid))?;
                let r = frame.axes;
                (node + r * x, r * tensor * r.transpose())
            }
        };
        Ok(MassPoint {
            mass: *mass,
            cg,
            inertia: tensor,
        })
    }

    /// Total mass, center of gravity and inertia tensor of the selected
    /// elements about the query's reference point.
    pub fn mass_properties(&self, query: &MassQuery) -> Result<MassProperties> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        let reference = Vector3::from(query.reference_point);
        let mut mass = 0.0;
        let mut moment = Vector3::zeros();
        let mut inertia = Matrix3::zeros();
        for element in self.elements().values().filter(|e| query.selects(e)) {
            let point = self.mass_point(element)?;
            if point.mass == 0.0 && point.inertia == Matrix3::zeros() {
                continue;
            }
            mass += point.mass;
            moment += point.mass * point.cg;
            inertia += point.inertia + parallel_axis(point.mass, point.cg - reference);
        }
        let cg = if mass != 0.0 { moment / mass } else { Vector3::zeros() };
        debug!(mass, "mass properties computed");
        Ok(MassProperties { mass, cg, inertia })
    }

    /// Mass per property id.
    pub fn mass_breakdown(&self) -> Result<BTreeMap<i32, f64>> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        let mut breakdown = BTreeMap::new();
        for element in self.elements().values() {
            if let Some(pid) = element.pid {
                *breakdown.entry(pid).or_insert(0.0) += self.mass_point(element)?.mass;
            }
        }
        Ok(breakdown)
    }

    /// Area per property id: summed element areas for shell properties,
    /// the section area for line properties.
    pub fn area_breakdown(&self) -> Result<BTreeMap<i32, f64>> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        let mut breakdown = BTreeMap::new();
        for (&pid, property) in self.properties() {
            if let Some(area) = property.section_area() {
                breakdown.insert(pid, area);
            }
        }
        for element in self.elements().values() {
            if element.element_type.family() != ElementFamily::Shell {
                continue;
            }
            if let Some(pid) = element.pid {
                *breakdown.entry(pid).or_insert(0.0) += self.area_normal_of(element)?.0;
            }
        }
        Ok(breakdown)
    }

    /// Resultant force and moment of a load case about `reference_point`.
    pub fn sum_forces_moments(
        &self,
        sid: i32,
        reference_point: [f64; 3],
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        if !self.loads().contains_key(&sid) {
            return Err(ModelError::dangling("load query", "sid", Category::LoadSet, sid));
        }
        let reference = Vector3::from(reference_point);
        let mut force = Vector3::zeros();
        let mut moment = Vector3::zeros();
        // (force or couple, point of application)
        let mut contributions: Vec<(Vector3<f64>, Vector3<f64>)> = Vec::new();

        for load in self.load_case(sid) {
            let label = load.label();
            match load {
                Load::Point(point) => {
                    let at = self.position_for(point.node, &label, "g")?;
                    let frame = self.frame(point.cid).map_err(|_| {
                        ModelError::dangling(&label, "cid", Category::Coord, point.cid)
                    })?;
                    let vector = frame.direction_to_basic(Vector3::from(point.vector()), at);
                    match point.kind {
                        PointLoadKind::Force => contributions.push((vector, at)),
                        PointLoadKind::Moment => moment += vector,
                    }
                }
                Load::Pload(pload) => {
                    let points = pload
                        .nodes
                        .iter()
                        .map(|nid| self.position_for(*nid, &label, "g"))
                        .collect::<Result<Vec<_>>>()?;
                    let (area, normal) = polygon_area_normal(&points, &label)?;
                    let centroid = points.iter().sum::<Vector3<f64>>() / points.len() as f64;
                    contributions.push((pload.pressure * area * normal, centroid));
                }
                Load::Pload2(pload2) => {
                    for eid in &pload2.elements {
                        let element = self.element(*eid).ok_or_else(|| {
                            ModelError::dangling(&label, "eid", Category::Element, *eid)
                        })?;
                        let (area, normal) = self.area_normal_of(element)?;
                        contributions.push((pload2.pressure * area * normal, self.centroid_of(element)?));
                    }
                }
            }
        }
        for (f, at) in contributions {
            force += f;
            moment += (at - reference).cross(&f);
        }
        Ok((force, moment))
    }
}

/// Mass per unit length integrated over a PBEAM's stations and its first
/// moment, both per unit element length.
fn beam_mass(beam: &PBeam, rho: f64) -> (f64, f64) {
    let profile: Vec<(f64, f64)> = beam
        .profile()
        .into_iter()
        .map(|(x, area, nsm)| (x, rho * area + nsm))
        .collect();
    integrate_profile(&profile)
}

/// Mean corner thickness of a shell; corners without a value use `t`.
fn shell_thickness(element: &Element, t: f64) -> f64 {
    let ElementData::Shell {
        tflag, thickness, ..
    } = &element.data
    else {
        return t;
    };
    if thickness.iter().all(Option::is_none) {
        return t;
    }
    let corners = element.element_type.corner_nodes();
    let sum: f64 = thickness[..corners]
        .iter()
        .map(|ti| match (ti, tflag) {
            (Some(ti), 1) => ti * t,
            (Some(ti), _) => *ti,
            (None, _) => t,
        })
        .sum();
    sum / corners as f64
}

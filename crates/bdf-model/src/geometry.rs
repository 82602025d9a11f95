//! Element geometry from cross-referenced node positions.

use nalgebra::Vector3;

use crate::error::{Category, ModelError, Result};
use crate::mesh::{Element, ElementFamily, ElementType};
use crate::model::BdfModel;

const TETRA_TRIS: &[[usize; 3]] = &[[0, 1, 2], [0, 1, 3], [1, 2, 3], [0, 2, 3]];
const PENTA_TRIS: &[[usize; 3]] = &[[0, 1, 2], [3, 4, 5]];
const PENTA_QUADS: &[[usize; 4]] = &[[0, 1, 4, 3], [1, 2, 5, 4], [2, 0, 3, 5]];
const HEXA_QUADS: &[[usize; 4]] = &[
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

/// Area and unit normal of a planar or warped 3 or 4 point polygon.
///
/// Quads are split along the 1-3 diagonal; the normal of a quad is the
/// normalized cross product of its diagonals.
pub fn polygon_area_normal(points: &[Vector3<f64>], entity: &str) -> Result<(f64, Vector3<f64>)> {
    let (area, n) = match points {
        [a, b, c] => {
            let n = (b - a).cross(&(c - a));
            (n.norm() / 2.0, n)
        }
        [a, b, c, d] => {
            let area = ((b - a).cross(&(c - a)).norm() + (c - a).cross(&(d - a)).norm()) / 2.0;
            (area, (c - a).cross(&(d - b)))
        }
        _ => {
            return Err(ModelError::degenerate(
                entity,
                format!("{} points do not form a face", points.len()),
            ));
        }
    };
    if n.norm() <= f64::EPSILON {
        return Err(ModelError::degenerate(entity, "zero area"));
    }
    Ok((area, n.normalize()))
}

/// Volume and centroid of a solid by tetrahedra about its corner centroid.
fn solid_volume_centroid(
    element_type: ElementType,
    corners: &[Vector3<f64>],
) -> (f64, Vector3<f64>) {
    let center = mean(corners);
    let mut triangles: Vec<[usize; 3]> = Vec::new();
    let (tris, quads): (&[[usize; 3]], &[[usize; 4]]) = match element_type {
        ElementType::Ctetra => (TETRA_TRIS, &[]),
        ElementType::Cpenta => (PENTA_TRIS, PENTA_QUADS),
        _ => (&[], HEXA_QUADS),
    };
    triangles.extend_from_slice(tris);
    for &[a, b, c, d] in quads {
        triangles.push([a, b, c]);
        triangles.push([a, c, d]);
    }

    let mut volume = 0.0;
    let mut moment = Vector3::zeros();
    for [i, j, k] in triangles {
        let (a, b, c) = (corners[i], corners[j], corners[k]);
        let v = ((a - center).dot(&(b - center).cross(&(c - center)))).abs() / 6.0;
        volume += v;
        moment += v * (a + b + c + center) / 4.0;
    }
    let centroid = if volume > 0.0 { moment / volume } else { center };
    (volume, centroid)
}

fn mean(points: &[Vector3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().sum();
    sum / points.len().max(1) as f64
}

impl BdfModel {
    /// Position of a node in the basic system.
    pub fn node_position(&self, nid: i32) -> Result<Vector3<f64>> {
        self.position_for(nid, "position query", "nid")
    }

    pub(crate) fn position_for(&self, nid: i32, referrer: &str, field: &str) -> Result<Vector3<f64>> {
        let cache = self.xref.as_ref().ok_or(ModelError::NotCrossReferenced)?;
        cache
            .positions
            .get(&nid)
            .copied()
            .ok_or_else(|| ModelError::dangling(referrer, field, Category::Node, nid))
    }

    fn lookup(&self, eid: i32) -> Result<&Element> {
        if self.xref.is_none() {
            return Err(ModelError::NotCrossReferenced);
        }
        self.element(eid)
            .ok_or_else(|| ModelError::dangling("geometry query", "eid", Category::Element, eid))
    }

    /// Basic positions of an element's corner nodes.
    pub fn corner_positions(&self, element: &Element) -> Result<Vec<Vector3<f64>>> {
        let label = element.label();
        let corners = element.element_type.corner_nodes();
        element
            .nodes
            .iter()
            .take(corners)
            .enumerate()
            .map(|(k, nid)| {
                let field = format!("g{}", k + 1);
                match nid {
                    Some(nid) => self.position_for(*nid, &label, &field),
                    None => Err(ModelError::degenerate(&label, format!("corner {field} is blank"))),
                }
            })
            .collect()
    }

    /// Distance between the end nodes of a line element.
    pub fn element_length(&self, eid: i32) -> Result<f64> {
        let element = self.lookup(eid)?;
        self.length_of(element)
    }

    pub(crate) fn length_of(&self, element: &Element) -> Result<f64> {
        if element.element_type.family() != ElementFamily::Line {
            return Err(ModelError::degenerate(element.label(), "has no length"));
        }
        let p = self.corner_positions(element)?;
        Ok((p[1] - p[0]).norm())
    }

    /// Area of a shell element.
    pub fn element_area(&self, eid: i32) -> Result<f64> {
        let element = self.lookup(eid)?;
        Ok(self.area_normal_of(element)?.0)
    }

    /// Unit normal of a shell element, following the G1 G2 G3 ordering.
    pub fn element_normal(&self, eid: i32) -> Result<Vector3<f64>> {
        let element = self.lookup(eid)?;
        Ok(self.area_normal_of(element)?.1)
    }

    pub(crate) fn area_normal_of(&self, element: &Element) -> Result<(f64, Vector3<f64>)> {
        if element.element_type.family() != ElementFamily::Shell {
            return Err(ModelError::degenerate(element.label(), "has no area"));
        }
        let p = self.corner_positions(element)?;
        polygon_area_normal(&p, &element.label())
    }

    /// Volume of a solid element.
    pub fn element_volume(&self, eid: i32) -> Result<f64> {
        let element = self.lookup(eid)?;
        Ok(self.volume_centroid_of(element)?.0)
    }

    pub(crate) fn volume_centroid_of(&self, element: &Element) -> Result<(f64, Vector3<f64>)> {
        if element.element_type.family() != ElementFamily::Solid {
            return Err(ModelError::degenerate(element.label(), "has no volume"));
        }
        let p = self.corner_positions(element)?;
        Ok(solid_volume_centroid(element.element_type, &p))
    }

    /// Centroid of an element: the mean of its corners, or the volume
    /// centroid for solids.
    pub fn element_centroid(&self, eid: i32) -> Result<Vector3<f64>> {
        let element = self.lookup(eid)?;
        self.centroid_of(element)
    }

    pub(crate) fn centroid_of(&self, element: &Element) -> Result<Vector3<f64>> {
        match element.element_type.family() {
            ElementFamily::Solid => Ok(self.volume_centroid_of(element)?.1),
            _ => Ok(mean(&self.corner_positions(element)?)),
        }
    }
}

//! Cross-reference pass: validates ids and resolves coordinate frames.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constraints::Constraint;
use crate::coords::{BASIC, CoordDef, CoordKind, Frame};
use crate::error::{Category, ModelError, Result};
use crate::loads::Load;
use crate::mesh::{ElementData, Orientation, ThetaMcid};
use crate::model::BdfModel;

/// How the pass reacts to a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum XrefMode {
    /// Stop at the first problem.
    Strict,
    /// Record every problem once and continue without the reference.
    #[default]
    Safe,
}

/// Outcome of a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct XrefReport {
    /// Coordinate systems resolved into the basic frame, including 0
    pub frames: usize,
    /// Nodes with a basic position
    pub nodes: usize,
    /// Problems recorded in safe mode
    pub errors: usize,
}

/// Derived data owned by the model after a pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct XrefCache {
    pub frames: BTreeMap<i32, Frame>,
    pub positions: BTreeMap<i32, Vector3<f64>>,
}

struct Resolver<'a> {
    model: &'a BdfModel,
    mode: XrefMode,
    errors: Vec<ModelError>,
    frames: BTreeMap<i32, Option<Frame>>,
    positions: BTreeMap<i32, Option<Vector3<f64>>>,
    in_progress: Vec<i32>,
}

impl<'a> Resolver<'a> {
    fn new(model: &'a BdfModel, mode: XrefMode) -> Self {
        Self {
            model,
            mode,
            errors: Vec::new(),
            frames: BTreeMap::from([(BASIC, Some(Frame::basic()))]),
            positions: BTreeMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn problem(&mut self, error: ModelError) -> Result<()> {
        match self.mode {
            XrefMode::Strict => Err(error),
            XrefMode::Safe => {
                warn!(%error, "cross-reference problem");
                self.errors.push(error);
                Ok(())
            }
        }
    }

    fn dangling(&mut self, referrer: &str, field: &str, category: Category, id: i32) -> Result<()> {
        self.problem(ModelError::dangling(referrer, field, category, id))
    }

    /// Resolved frame of `cid`; `None` after a recorded problem.
    fn frame(&mut self, cid: i32, referrer: &str, field: &str) -> Result<Option<Frame>> {
        if let Some(frame) = self.frames.get(&cid) {
            return Ok(*frame);
        }
        let model = self.model;
        let Some(system) = model.coord(cid) else {
            self.dangling(referrer, field, Category::Coord, cid)?;
            return Ok(None);
        };
        if let Some(start) = self.in_progress.iter().position(|id| *id == cid) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(cid);
            self.problem(ModelError::CoordinateCycle { chain })?;
            return Ok(None);
        }

        let label = format!("{} {}", system.card_name(), cid);
        self.in_progress.push(cid);
        let resolved = self.build_frame(system.kind, &system.def, &label);
        self.in_progress.pop();
        let frame = resolved?;
        self.frames.insert(cid, frame);
        Ok(frame)
    }

    fn build_frame(
        &mut self,
        kind: CoordKind,
        def: &CoordDef,
        label: &str,
    ) -> Result<Option<Frame>> {
        let points = match def {
            CoordDef::Points { rid, a, b, c } => {
                let Some(reference) = self.frame(*rid, label, "rid")? else {
                    return Ok(None);
                };
                [a, b, c].map(|p| reference.to_basic(Vector3::from(*p)))
            }
            CoordDef::Nodes { g1, g2, g3 } => {
                let mut points = [Vector3::zeros(); 3];
                for (point, (nid, field)) in points.iter_mut().zip([(*g1, "g1"), (*g2, "g2"), (*g3, "g3")]) {
                    match self.position(nid, label, field)? {
                        Some(p) => *point = p,
                        None => return Ok(None),
                    }
                }
                points
            }
        };
        match Frame::from_points(kind, points[0], points[1], points[2], label) {
            Ok(frame) => Ok(Some(frame)),
            Err(error) => {
                self.problem(error)?;
                Ok(None)
            }
        }
    }

    /// Basic position of a node; `None` when it is missing or its CP failed.
    fn position(&mut self, nid: i32, referrer: &str, field: &str) -> Result<Option<Vector3<f64>>> {
        if let Some(position) = self.positions.get(&nid) {
            return Ok(*position);
        }
        let model = self.model;
        let Some(node) = model.node(nid) else {
            self.dangling(referrer, field, Category::Node, nid)?;
            return Ok(None);
        };
        let label = format!("GRID {nid}");
        let position = self
            .frame(node.cp, &label, "cp")?
            .map(|frame| frame.to_basic(Vector3::from(node.xyz)));
        self.positions.insert(nid, position);
        Ok(position)
    }

    fn check_node(&mut self, nid: i32, referrer: &str, field: &str) -> Result<()> {
        if self.model.node(nid).is_none() {
            self.dangling(referrer, field, Category::Node, nid)?;
        }
        Ok(())
    }

    fn check_material(&mut self, mid: i32, referrer: &str, field: &str) -> Result<()> {
        if self.model.material(mid).is_none() {
            self.dangling(referrer, field, Category::Material, mid)?;
        }
        Ok(())
    }

    fn check_coords_and_nodes(&mut self) -> Result<()> {
        let model = self.model;
        for (&cid, system) in model.coords() {
            let label = format!("{} {}", system.card_name(), cid);
            self.frame(cid, &label, "cid")?;
        }
        for (&nid, node) in model.nodes() {
            let label = format!("GRID {nid}");
            self.position(nid, &label, "nid")?;
            if node.cd != BASIC {
                self.frame(node.cd, &label, "cd")?;
            }
        }
        Ok(())
    }

    fn check_elements(&mut self) -> Result<()> {
        let model = self.model;
        for element in model.elements().values() {
            let label = element.label();
            for (k, nid) in element.nodes.iter().enumerate() {
                if let Some(nid) = nid {
                    self.check_node(*nid, &label, &format!("g{}", k + 1))?;
                }
            }
            if let Some(pid) = element.pid {
                match model.property(pid) {
                    None => self.dangling(&label, "pid", Category::Property, pid)?,
                    Some(property) if !property.accepts(element.element_type) => {
                        self.problem(ModelError::PropertyMismatch {
                            element: element.id,
                            element_type: element.element_type.card_name().to_string(),
                            property: pid,
                            property_type: property.card_name().to_string(),
                        })?;
                    }
                    Some(_) => {}
                }
            }
            match &element.data {
                ElementData::Conrod { mid, .. } => self.check_material(*mid, &label, "mid")?,
                ElementData::Bar {
                    orientation: Orientation::Node(g0),
                    ..
                } => self.check_node(*g0, &label, "g0")?,
                ElementData::Shell {
                    theta_mcid: ThetaMcid::Mcid(mcid),
                    ..
                } => {
                    self.frame(*mcid, &label, "mcid")?;
                }
                ElementData::Mass { cid, .. } if *cid > 0 => {
                    self.frame(*cid, &label, "cid")?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_properties(&mut self) -> Result<()> {
        let model = self.model;
        for property in model.properties().values() {
            let label = property.label();
            for (field, mid) in property.material_refs() {
                self.check_material(mid, &label, &field)?;
            }
        }
        Ok(())
    }

    fn check_loads(&mut self) -> Result<()> {
        let model = self.model;
        for load in model.loads().values().flatten() {
            let label = load.label();
            match load {
                Load::Point(point) => {
                    self.check_node(point.node, &label, "g")?;
                    self.frame(point.cid, &label, "cid")?;
                }
                Load::Pload(pload) => {
                    for (k, nid) in pload.nodes.iter().enumerate() {
                        self.check_node(*nid, &label, &format!("g{}", k + 1))?;
                    }
                }
                Load::Pload2(pload2) => {
                    for eid in &pload2.elements {
                        if model.element(*eid).is_none() {
                            self.dangling(&label, "eid", Category::Element, *eid)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_constraints(&mut self) -> Result<()> {
        let model = self.model;
        for constraint in model.spcs().values().chain(model.mpcs().values()).flatten() {
            let label = constraint.label();
            for nid in constraint.node_ids() {
                self.check_node(nid, &label, "g")?;
            }
        }
        for constraint in model.spcadds().values().chain(model.mpcadds().values()) {
            let label = constraint.label();
            match constraint {
                Constraint::SpcAdd { sets, .. } => {
                    for sid in sets {
                        if !model.spcs().contains_key(sid) && !model.spcadds().contains_key(sid) {
                            self.dangling(&label, "s", Category::SpcSet, *sid)?;
                        }
                    }
                }
                Constraint::MpcAdd { sets, .. } => {
                    for sid in sets {
                        if !model.mpcs().contains_key(sid) && !model.mpcadds().contains_key(sid) {
                            self.dangling(&label, "s", Category::MpcSet, *sid)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.check_coords_and_nodes()?;
        self.check_elements()?;
        self.check_properties()?;
        self.check_loads()?;
        self.check_constraints()
    }

    fn into_cache(self) -> (XrefCache, Vec<ModelError>) {
        let cache = XrefCache {
            frames: self
                .frames
                .into_iter()
                .filter_map(|(id, frame)| frame.map(|f| (id, f)))
                .collect(),
            positions: self
                .positions
                .into_iter()
                .filter_map(|(id, p)| p.map(|p| (id, p)))
                .collect(),
        };
        (cache, self.errors)
    }
}

impl BdfModel {
    /// Validate every id reference and cache coordinate frames and node
    /// positions in the basic system.
    ///
    /// Previous results are discarded first, so running the pass again
    /// recomputes everything. In strict mode the first problem is returned
    /// and the model stays unresolved. In safe mode each dangling reference
    /// is recorded once (see [`BdfModel::pop_xref_errors`]) and the pass
    /// completes without it.
    pub fn cross_reference(&mut self, mode: XrefMode) -> Result<XrefReport> {
        self.xref = None;
        self.xref_errors.clear();
        info!(?mode, "cross-referencing model");

        let mut resolver = Resolver::new(self, mode);
        resolver.run()?;
        let (cache, errors) = resolver.into_cache();

        let report = XrefReport {
            frames: cache.frames.len(),
            nodes: cache.positions.len(),
            errors: errors.len(),
        };
        debug!(?report, "cross-reference finished");
        self.xref = Some(cache);
        self.xref_errors = errors;
        Ok(report)
    }

    /// Resolved frame of a coordinate system.
    pub fn frame(&self, cid: i32) -> Result<Frame> {
        let cache = self.xref.as_ref().ok_or(ModelError::NotCrossReferenced)?;
        cache
            .frames
            .get(&cid)
            .copied()
            .ok_or_else(|| ModelError::dangling("frame query", "cid", Category::Coord, cid))
    }
}

//! Element properties.

use std::f64::consts::PI;

use bdf_inp::{Card, FieldValue};

use crate::error::Result;
use crate::mesh::{ElementType, nonzero};

/// PROD: `PID MID A J C NSM`
#[derive(Debug, Clone, PartialEq)]
pub struct PRod {
    pub id: i32,
    pub mid: i32,
    pub a: f64,
    pub j: f64,
    pub c: f64,
    pub nsm: f64,
}

/// PTUBE: `PID MID OD T NSM OD2`
#[derive(Debug, Clone, PartialEq)]
pub struct PTube {
    pub id: i32,
    pub mid: i32,
    pub od: f64,
    /// Wall thickness; `None` for a solid circular rod
    pub t: Option<f64>,
    pub nsm: f64,
    /// Diameter at end B; `None` for a constant section
    pub od2: Option<f64>,
}

impl PTube {
    fn area_for(&self, od: f64) -> f64 {
        let t = self.t.unwrap_or(od / 2.0);
        let id = od - 2.0 * t;
        PI / 4.0 * (od * od - id * id)
    }

    /// Mean area over the length; exact for a linear taper.
    pub fn area(&self) -> f64 {
        let a = self.area_for(self.od);
        let b = self.area_for(self.od2.unwrap_or(self.od));
        (a + b) / 2.0
    }
}

/// PBAR: `PID MID A I1 I2 J NSM -; C1 C2 D1 D2 E1 E2 F1 F2; K1 K2 I12`
#[derive(Debug, Clone, PartialEq)]
pub struct PBar {
    pub id: i32,
    pub mid: i32,
    pub a: f64,
    pub i1: f64,
    pub i2: f64,
    pub j: f64,
    pub nsm: f64,
    /// Stress recovery points C1 C2 D1 D2 E1 E2 F1 F2
    pub stress_points: [f64; 8],
    pub k1: Option<f64>,
    pub k2: Option<f64>,
    pub i12: f64,
}

/// One PBEAM station; the first one is end A.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamStation {
    /// Stress output request (`YES`, `YESA`, `NO`); `None` for end A
    pub so: Option<String>,
    /// Position as a fraction of the length
    pub x: f64,
    pub a: f64,
    pub i1: f64,
    pub i2: f64,
    pub i12: f64,
    pub j: f64,
    pub nsm: f64,
    /// C1 C2 D1 D2 E1 E2 F1 F2
    pub stress_points: [f64; 8],
}

/// PBEAM with linearly varying stations.
#[derive(Debug, Clone, PartialEq)]
pub struct PBeam {
    pub id: i32,
    pub mid: i32,
    pub stations: Vec<BeamStation>,
    /// K1 K2 S1 S2 NSI(A) NSI(B) CW(A) CW(B)
    pub footer: [f64; 8],
    /// M1(A) M2(A) M1(B) M2(B) N1(A) N2(A) N1(B) N2(B)
    pub offsets: [f64; 8],
}

impl PBeam {
    /// Stations sorted by position, closed at x = 1 with the last values.
    pub fn profile(&self) -> Vec<(f64, f64, f64)> {
        let mut points: Vec<(f64, f64, f64)> =
            self.stations.iter().map(|s| (s.x, s.a, s.nsm)).collect();
        points.sort_by(|l, r| l.0.total_cmp(&r.0));
        if let Some(&(x, a, nsm)) = points.last() {
            if x < 1.0 {
                points.push((1.0, a, nsm));
            }
        }
        points
    }

    /// PBEAM layout:
    ///
    /// ```text
    /// PID MID A I1 I2 I12 J NSM          end A
    /// C1 C2 D1 D2 E1 E2 F1 F2            end A stress points (optional)
    /// SO X/XB A I1 I2 I12 J NSM          station, repeated
    /// C1 C2 D1 D2 E1 E2 F1 F2            only after SO = YES
    /// K1 K2 S1 S2 NSI(A) NSI(B) CW(A) CW(B)
    /// M1(A) M2(A) M1(B) M2(B) N1(A) N2(A) N1(B) N2(B)
    /// ```
    pub fn from_card(card: &Card) -> Result<Self> {
        let rows = card.nfields().saturating_sub(2) / 8 + 1;
        let at = |row: usize, k: usize| 1 + 8 * row + k;
        let is_station = |row: usize| {
            matches!(
                card.field(at(row, 0)).to_ascii_uppercase().as_str(),
                "YES" | "YESA" | "NO"
            )
        };

        let id = card.id(1, "pid")?;
        let mid = card.id(2, "mid")?;
        let a = card.real_or_blank(3, "a", 0.0)?;
        let i1 = card.real_or_blank(4, "i1", 0.0)?;
        let i2 = card.real_or_blank(5, "i2", 0.0)?;
        let i12 = card.real_or_blank(6, "i12", 0.0)?;
        let j = card.real_or_blank(7, "j", 0.0)?;
        let nsm = card.real_or_blank(8, "nsm", 0.0)?;

        let mut row = 1;
        let mut end_a_points = [0.0; 8];
        if row < rows && !is_station(row) {
            end_a_points = stress_points(card, at(row, 0))?;
            row += 1;
        }
        let end_a = BeamStation {
            so: None,
            x: 0.0,
            a,
            i1,
            i2,
            i12,
            j,
            nsm,
            stress_points: end_a_points,
        };

        let mut stations = vec![end_a.clone()];
        while row < rows && is_station(row) {
            let so = card.string(at(row, 0), "so")?;
            let x = card.real(at(row, 1), "x/xb")?;
            if !(0.0..=1.0).contains(&x) {
                return Err(card
                    .validation(format!("station x/xb {x} is outside 0.0 to 1.0"))
                    .into());
            }
            let mut station = BeamStation {
                so: Some(so.clone()),
                x,
                a: card.real_or_blank(at(row, 2), "a", end_a.a)?,
                i1: card.real_or_blank(at(row, 3), "i1", end_a.i1)?,
                i2: card.real_or_blank(at(row, 4), "i2", end_a.i2)?,
                i12: card.real_or_blank(at(row, 5), "i12", end_a.i12)?,
                j: card.real_or_blank(at(row, 6), "j", end_a.j)?,
                nsm: card.real_or_blank(at(row, 7), "nsm", end_a.nsm)?,
                stress_points: [0.0; 8],
            };
            row += 1;
            if so == "YES" && row < rows {
                station.stress_points = stress_points(card, at(row, 0))?;
                row += 1;
            }
            stations.push(station);
        }

        if rows - row > 2 {
            return Err(card
                .validation(format!(
                    "{} rows after the last station, at most 2 allowed",
                    rows - row
                ))
                .into());
        }

        let f = at(row, 0);
        let mut footer = [0.0; 8];
        footer[0] = card.real_or_blank(f, "k1", 1.0)?;
        footer[1] = card.real_or_blank(f + 1, "k2", 1.0)?;
        footer[2] = card.real_or_blank(f + 2, "s1", 0.0)?;
        footer[3] = card.real_or_blank(f + 3, "s2", 0.0)?;
        footer[4] = card.real_or_blank(f + 4, "nsi_a", 0.0)?;
        footer[5] = card.real_or_blank(f + 5, "nsi_b", footer[4])?;
        footer[6] = card.real_or_blank(f + 6, "cw_a", 0.0)?;
        footer[7] = card.real_or_blank(f + 7, "cw_b", footer[6])?;

        let o = f + 8;
        let mut offsets = [0.0; 8];
        // each second component defaults to the first one of its pair
        let names = ["m1_a", "m2_a", "m1_b", "m2_b", "n1_a", "n2_a", "n1_b", "n2_b"];
        for (k, name) in names.into_iter().enumerate() {
            let default = if k % 2 == 1 { offsets[k - 1] } else { 0.0 };
            offsets[k] = card.real_or_blank(o + k, name, default)?;
        }

        Ok(Self {
            id,
            mid,
            stations,
            footer,
            offsets,
        })
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec!["PBEAM".into(), self.id.into(), self.mid.into()];
        for (index, s) in self.stations.iter().enumerate() {
            if index > 0 {
                f.push(s.so.clone().into());
                f.push(s.x.into());
            }
            f.extend([s.a, s.i1, s.i2, s.i12, s.j, s.nsm].map(FieldValue::from));
            if index == 0 || s.so.as_deref() == Some("YES") {
                f.extend(s.stress_points.map(FieldValue::from));
            }
        }
        f.extend(self.footer.map(FieldValue::from));
        f.extend(self.offsets.map(FieldValue::from));
        f
    }
}

fn stress_points(card: &Card, first: usize) -> Result<[f64; 8]> {
    let mut points = [0.0; 8];
    for (k, p) in points.iter_mut().enumerate() {
        *p = card.real_or_blank(first + k, "stress point", 0.0)?;
    }
    Ok(points)
}

/// PSHELL: `PID MID1 T MID2 12I/T**3 MID3 TS/T NSM; Z1 Z2 MID4`
#[derive(Debug, Clone, PartialEq)]
pub struct PShell {
    pub id: i32,
    pub mid1: Option<i32>,
    pub t: Option<f64>,
    pub mid2: Option<i32>,
    pub bending_ratio: f64,
    pub mid3: Option<i32>,
    pub ts_t: f64,
    pub nsm: f64,
    pub z1: Option<f64>,
    pub z2: Option<f64>,
    pub mid4: Option<i32>,
}

/// One PCOMP ply.
#[derive(Debug, Clone, PartialEq)]
pub struct Ply {
    pub mid: i32,
    pub t: f64,
    pub theta: f64,
    pub sout: Option<String>,
}

/// PCOMP: `PID Z0 NSM SB FT TREF GE LAM; MID1 T1 THETA1 SOUT1 MID2 T2 THETA2 SOUT2; ...`
#[derive(Debug, Clone, PartialEq)]
pub struct PComp {
    pub id: i32,
    pub z0: Option<f64>,
    pub nsm: f64,
    pub sb: f64,
    pub ft: Option<String>,
    pub tref: f64,
    pub ge: f64,
    pub lam: Option<String>,
    pub plies: Vec<Ply>,
}

impl PComp {
    /// True when the listed plies are half of a symmetric laminate.
    pub fn is_symmetric(&self) -> bool {
        self.lam.as_deref() == Some("SYM")
    }

    pub fn total_thickness(&self) -> f64 {
        let t: f64 = self.plies.iter().map(|p| p.t).sum();
        if self.is_symmetric() { 2.0 * t } else { t }
    }
}

/// PSOLID: `PID MID CORDM IN STRESS ISOP FCTN`
#[derive(Debug, Clone, PartialEq)]
pub struct PSolid {
    pub id: i32,
    pub mid: i32,
    pub cordm: i32,
    pub integration: FieldValue,
    pub stress: FieldValue,
    pub isop: FieldValue,
    pub fctn: Option<String>,
}

/// PELAS: `PID K GE S`, twice per card at most.
#[derive(Debug, Clone, PartialEq)]
pub struct PElas {
    pub id: i32,
    pub k: f64,
    pub ge: f64,
    pub s: f64,
}

/// A property record.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Rod(PRod),
    Tube(PTube),
    Bar(PBar),
    Beam(PBeam),
    Shell(PShell),
    Composite(PComp),
    Solid(PSolid),
    Elastic(PElas),
}

impl Property {
    pub fn id(&self) -> i32 {
        match self {
            Property::Rod(p) => p.id,
            Property::Tube(p) => p.id,
            Property::Bar(p) => p.id,
            Property::Beam(p) => p.id,
            Property::Shell(p) => p.id,
            Property::Composite(p) => p.id,
            Property::Solid(p) => p.id,
            Property::Elastic(p) => p.id,
        }
    }

    pub fn card_name(&self) -> &'static str {
        match self {
            Property::Rod(_) => "PROD",
            Property::Tube(_) => "PTUBE",
            Property::Bar(_) => "PBAR",
            Property::Beam(_) => "PBEAM",
            Property::Shell(_) => "PSHELL",
            Property::Composite(_) => "PCOMP",
            Property::Solid(_) => "PSOLID",
            Property::Elastic(_) => "PELAS",
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.card_name(), self.id())
    }

    /// Whether an element of `element_type` may reference this property.
    pub fn accepts(&self, element_type: ElementType) -> bool {
        use ElementType::*;
        match self {
            Property::Rod(_) => element_type == Crod,
            Property::Tube(_) => element_type == Ctube,
            Property::Bar(_) => element_type == Cbar,
            Property::Beam(_) => element_type == Cbeam,
            Property::Shell(_) | Property::Composite(_) => {
                matches!(element_type, Ctria3 | Ctria6 | Cquad4 | Cquad8)
            }
            Property::Solid(_) => matches!(element_type, Ctetra | Cpenta | Chexa),
            Property::Elastic(_) => element_type == Celas1,
        }
    }

    /// Referenced material ids with the field that names each.
    pub fn material_refs(&self) -> Vec<(String, i32)> {
        match self {
            Property::Rod(p) => vec![("mid".into(), p.mid)],
            Property::Tube(p) => vec![("mid".into(), p.mid)],
            Property::Bar(p) => vec![("mid".into(), p.mid)],
            Property::Beam(p) => vec![("mid".into(), p.mid)],
            Property::Shell(p) => [("mid1", p.mid1), ("mid2", p.mid2), ("mid3", p.mid3), ("mid4", p.mid4)]
                .into_iter()
                .filter_map(|(name, mid)| mid.map(|mid| (name.to_string(), mid)))
                .collect(),
            Property::Composite(p) => p
                .plies
                .iter()
                .enumerate()
                .map(|(k, ply)| (format!("ply {} mid", k + 1), ply.mid))
                .collect(),
            Property::Solid(p) => vec![("mid".into(), p.mid)],
            Property::Elastic(_) => Vec::new(),
        }
    }

    /// Cross-section area of line properties.
    pub fn section_area(&self) -> Option<f64> {
        match self {
            Property::Rod(p) => Some(p.a),
            Property::Tube(p) => Some(p.area()),
            Property::Bar(p) => Some(p.a),
            Property::Beam(p) => {
                let profile = p.profile();
                let area = profile
                    .windows(2)
                    .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
                    .sum();
                Some(area)
            }
            _ => None,
        }
    }

    pub fn prod_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(7)?;
        Ok(vec![Property::Rod(PRod {
            id: card.id(1, "pid")?,
            mid: card.id(2, "mid")?,
            a: card.real(3, "a")?,
            j: card.real_or_blank(4, "j", 0.0)?,
            c: card.real_or_blank(5, "c", 0.0)?,
            nsm: card.real_or_blank(6, "nsm", 0.0)?,
        })])
    }

    pub fn ptube_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(7)?;
        let od = card.real(3, "od")?;
        let t = card.real_or_none(4, "t")?;
        if let Some(t) = t {
            if t <= 0.0 || 2.0 * t > od {
                return Err(card.validation(format!("wall thickness {t} does not fit in OD {od}")).into());
            }
        }
        Ok(vec![Property::Tube(PTube {
            id: card.id(1, "pid")?,
            mid: card.id(2, "mid")?,
            od,
            t,
            nsm: card.real_or_blank(5, "nsm", 0.0)?,
            od2: card.real_or_none(6, "od2")?,
        })])
    }

    pub fn pbar_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(20)?;
        Ok(vec![Property::Bar(PBar {
            id: card.id(1, "pid")?,
            mid: card.id(2, "mid")?,
            a: card.real_or_blank(3, "a", 0.0)?,
            i1: card.real_or_blank(4, "i1", 0.0)?,
            i2: card.real_or_blank(5, "i2", 0.0)?,
            j: card.real_or_blank(6, "j", 0.0)?,
            nsm: card.real_or_blank(7, "nsm", 0.0)?,
            stress_points: stress_points(card, 9)?,
            k1: card.real_or_none(17, "k1")?,
            k2: card.real_or_none(18, "k2")?,
            i12: card.real_or_blank(19, "i12", 0.0)?,
        })])
    }

    pub fn pbeam_from_card(card: &Card) -> Result<Vec<Self>> {
        Ok(vec![Property::Beam(PBeam::from_card(card)?)])
    }

    pub fn pshell_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(12)?;
        Ok(vec![Property::Shell(PShell {
            id: card.id(1, "pid")?,
            mid1: card.id_or_blank(2, "mid1")?,
            t: card.real_or_none(3, "t")?,
            mid2: card.id_or_blank(4, "mid2")?,
            bending_ratio: card.real_or_blank(5, "12I/T**3", 1.0)?,
            mid3: card.id_or_blank(6, "mid3")?,
            ts_t: card.real_or_blank(7, "ts/t", 0.833333)?,
            nsm: card.real_or_blank(8, "nsm", 0.0)?,
            z1: card.real_or_none(9, "z1")?,
            z2: card.real_or_none(10, "z2")?,
            mid4: card.id_or_blank(11, "mid4")?,
        })])
    }

    pub fn pcomp_from_card(card: &Card) -> Result<Vec<Self>> {
        let mut plies: Vec<Ply> = Vec::new();
        let mut index = 9;
        while index < card.nfields() {
            if (index..index + 4).all(|i| card.is_blank(i)) {
                index += 4;
                continue;
            }
            let previous = plies.last();
            let mid = match (card.id_or_blank(index, "mid")?, previous) {
                (Some(mid), _) => mid,
                (None, Some(p)) => p.mid,
                (None, None) => card.id(index, "mid")?,
            };
            let t = match (card.real_or_none(index + 1, "t")?, previous) {
                (Some(t), _) => t,
                (None, Some(p)) => p.t,
                (None, None) => card.real(index + 1, "t")?,
            };
            if t <= 0.0 {
                return Err(card.validation(format!("ply {} thickness {t} must be positive", plies.len() + 1)).into());
            }
            plies.push(Ply {
                mid,
                t,
                theta: card.real_or_blank(index + 2, "theta", 0.0)?,
                sout: card.string_or_blank(index + 3, "sout")?,
            });
            index += 4;
        }
        if plies.is_empty() {
            return Err(card.validation("no plies").into());
        }

        Ok(vec![Property::Composite(PComp {
            id: card.id(1, "pid")?,
            z0: card.real_or_none(2, "z0")?,
            nsm: card.real_or_blank(3, "nsm", 0.0)?,
            sb: card.real_or_blank(4, "sb", 0.0)?,
            ft: card.string_or_blank(5, "ft")?,
            tref: card.real_or_blank(6, "tref", 0.0)?,
            ge: card.real_or_blank(7, "ge", 0.0)?,
            lam: card.string_or_blank(8, "lam")?,
            plies,
        })])
    }

    pub fn psolid_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(8)?;
        Ok(vec![Property::Solid(PSolid {
            id: card.id(1, "pid")?,
            mid: card.id(2, "mid")?,
            cordm: card.integer_or_blank(3, "cordm", 0)? as i32,
            integration: card.classify(4),
            stress: card.classify(5),
            isop: card.classify(6),
            fctn: card.string_or_blank(7, "fctn")?,
        })])
    }

    pub fn pelas_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(9)?;
        let mut properties = Vec::with_capacity(2);
        for base in [1usize, 5] {
            if base > 1 && (base..base + 4).all(|i| card.is_blank(i)) {
                break;
            }
            properties.push(Property::Elastic(PElas {
                id: card.id(base, "pid")?,
                k: card.real(base + 1, "k")?,
                ge: card.real_or_blank(base + 2, "ge", 0.0)?,
                s: card.real_or_blank(base + 3, "s", 0.0)?,
            }));
        }
        Ok(properties)
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec![self.card_name().into(), self.id().into()];
        match self {
            Property::Rod(p) => {
                f.push(p.mid.into());
                f.extend([p.a, p.j, p.c, p.nsm].map(FieldValue::from));
            }
            Property::Tube(p) => {
                f.extend([p.mid.into(), p.od.into(), p.t.into(), p.nsm.into(), p.od2.into()]);
            }
            Property::Bar(p) => {
                f.push(p.mid.into());
                f.extend([p.a, p.i1, p.i2, p.j, p.nsm].map(FieldValue::from));
                f.push(FieldValue::Blank);
                f.extend(p.stress_points.map(FieldValue::from));
                f.extend([p.k1.into(), p.k2.into(), p.i12.into()]);
            }
            Property::Beam(p) => return p.raw_fields(),
            Property::Shell(p) => {
                f.extend([
                    p.mid1.into(),
                    p.t.into(),
                    p.mid2.into(),
                    p.bending_ratio.into(),
                    p.mid3.into(),
                    p.ts_t.into(),
                    p.nsm.into(),
                    p.z1.into(),
                    p.z2.into(),
                    p.mid4.into(),
                ]);
            }
            Property::Composite(p) => {
                f.extend([
                    p.z0.into(),
                    p.nsm.into(),
                    p.sb.into(),
                    p.ft.clone().into(),
                    p.tref.into(),
                    p.ge.into(),
                    p.lam.clone().into(),
                ]);
                for ply in &p.plies {
                    f.extend([
                        ply.mid.into(),
                        ply.t.into(),
                        ply.theta.into(),
                        ply.sout.clone().into(),
                    ]);
                }
            }
            Property::Solid(p) => {
                f.extend([
                    p.mid.into(),
                    nonzero(p.cordm),
                    p.integration.clone(),
                    p.stress.clone(),
                    p.isop.clone(),
                    p.fctn.clone().into(),
                ]);
            }
            Property::Elastic(p) => {
                f.extend([p.k, p.ge, p.s].map(FieldValue::from));
            }
        }
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bdf_inp::{CardAssembler, CardEvent, FieldWidth, StrLines, print_card};

    fn assemble(lines: &[&str]) -> Card {
        let text = lines.join("\n");
        let mut asm = CardAssembler::new(StrLines::new(&text));
        match asm.next_card().unwrap() {
            Some(CardEvent::Card(card)) => card,
            other => panic!("expected a card, got {other:?}"),
        }
    }

    fn pbeam(lines: &[&str]) -> PBeam {
        PBeam::from_card(&assemble(lines)).unwrap()
    }

    fn small_lines(fields: &[FieldValue]) -> Vec<String> {
        print_card(fields, FieldWidth::Small)
            .unwrap()
            .lines()
            .map(|l| l.replacen('+', " ", 1))
            .collect()
    }

    #[test]
    fn pbeam_station_with_stress_points() {
        let p = pbeam(&[
            "PBEAM,39,6,2.9,3.5,5.97",
            "     ,  , ,2.0,-4.0",
            "     ,YES,1.0,5.3,56.2,78.6",
            "     ,   ,   ,2.5,-5.0",
            "     ,   ,   ,1.1,    ,2.1,,0.21",
            "     ,   ,   ,   ,    ,0.5,,0.0",
        ]);
        assert_eq!(p.stations.len(), 2);
        assert_eq!(p.stations[1].a, 5.3);
        assert_eq!(p.stations[1].stress_points[2], 2.5);
        assert_eq!(p.footer, [1.0, 1.0, 1.1, 0.0, 2.1, 2.1, 0.21, 0.21]);
        assert_eq!(p.offsets[4], 0.5);
        assert_eq!(p.offsets[5], 0.5);
        assert_eq!(p.offsets[6], 0.0);

        let expected = [
            "PBEAM         39       6     2.9     3.5    5.97      0.      0.      0.",
            "              0.      0.      2.     -4.      0.      0.      0.      0.",
            "             YES      1.     5.3    56.2    78.6      0.      0.      0.",
            "              0.      0.     2.5     -5.      0.      0.      0.      0.",
            "              1.      1.     1.1      0.     2.1     2.1     .21     .21",
            "              0.      0.      0.      0.      .5      .5      0.      0.",
        ];
        assert_eq!(small_lines(&p.raw_fields()), expected);
    }

    #[test]
    fn pbeam_blank_station_values_inherit_end_a() {
        let p = pbeam(&[
            "PBEAM   1       1       1.      60.     1.                              PBEAM1",
            "+BEAM1  5.              -5.                                             PBEAM2",
            "+BEAM2  YES     1.      2.      240.                                    PBEAM3",
            "+BEAM3  10.             -10.                                            PBEAM4",
            "+BEAM4                  -.666667",
        ]);
        let end_b = &p.stations[1];
        assert_eq!(end_b.i2, 1.0);
        assert_eq!(end_b.stress_points[0], 10.0);
        assert_eq!(p.footer[2], -0.666667);
        let expected = [
            "PBEAM          1       1      1.     60.      1.      0.      0.      0.",
            "              5.      0.     -5.      0.      0.      0.      0.      0.",
            "             YES      1.      2.    240.      1.      0.      0.      0.",
            "             10.      0.    -10.      0.      0.      0.      0.      0.",
            "              1.      1.-.666667      0.      0.      0.      0.      0.",
            "              0.      0.      0.      0.      0.      0.      0.      0.",
        ];
        assert_eq!(small_lines(&p.raw_fields()), expected);
    }

    #[test]
    fn pbeam_no_station_without_end_a_stress_line() {
        let p = pbeam(&[
            "PBEAM          4       1 5.094+7 289940.1.6043+7         271610. 3.73058",
            "              NO     1.0 .7489+7 238250.1.3182+7   1.-12 223170.3.458069",
            "              0.      0.           .872    .718",
        ]);
        assert_eq!(p.stations.len(), 2);
        assert_eq!(p.stations[0].stress_points, [0.0; 8]);
        assert_relative_eq!(p.stations[1].a, 0.7489e7);
        assert_relative_eq!(p.stations[1].i12, 1.0e-12);
        assert_eq!(p.footer[0], 0.0);
        assert_eq!(p.footer[3], 0.872);
        assert_eq!(p.footer[4], 0.718);
    }

    #[test]
    fn pbeam_rejects_bad_station_and_extra_rows() {
        let bad_x = PBeam::from_card(&assemble(&[
            "PBEAM          2       1 5.094+7 289940.1.6043+7         271610. 3.73058",
            "+",
            "              NO     1.4 .7489+7 238250.1.3182+7   1.-12 223170.3.458069",
        ]));
        assert!(bad_x.is_err());

        let extra = PBeam::from_card(&assemble(&[
            "PBEAM          3       1 5.094+7 289940.1.6043+7         271610. 3.73058",
            "            0.",
            "              NO     1.0 .7489+7 238250.1.3182+7   1.-12 223170.3.458069",
            "            0.",
            "              0.      0.           .872    .718",
            "              0.  .33936      0. .31983",
        ]));
        assert!(extra.is_err());
    }

    #[test]
    fn pbeam_large_field_matches_small_field_values() {
        let p = pbeam(&[
            "PBEAM*   4570049         4570010        .12             2.56-4          *    HRY",
            "*    HRY.005625                         8.889-4         6.4444-7        *    HRZ",
            "*    HRZ-.04            -.75            .04             -.75            *    HSA",
            "*    HSA.04             .75             -.04            .75             *    HSB",
            "*    HSB YES            1.              .12             2.56-4          *    HSC",
            "*    HSC.005625                         8.889-4         6.4444-7        *    HSD",
            "*    HSD-.04            -.75            .04             -.75            *    HSE",
            "*    HSE.04             .75             -.04            .75             *    HSF",
            "*    HSF.853433         .849842                                         *    HSG",
            "*    HSG",
        ]);
        assert_eq!(p.id, 4570049);
        assert_eq!(p.stations.len(), 2);
        assert_relative_eq!(p.stations[0].i1, 0.000256);
        assert_eq!(p.stations[0].i12, 0.0);
        assert_relative_eq!(p.stations[1].nsm, 6.4444e-7);
        assert_eq!(p.stations[1].stress_points[7], 0.75);
        assert_eq!(p.footer[0], 0.853433);
        assert_eq!(p.footer[1], 0.849842);
    }

    #[test]
    fn beam_profile_closes_at_end_b() {
        let p = pbeam(&["PBEAM,1,2,3.0,,,,,0.5"]);
        assert_eq!(p.profile(), vec![(0.0, 3.0, 0.5), (1.0, 3.0, 0.5)]);
    }

    #[test]
    fn pcomp_plies_inherit_and_sym_doubles() {
        let card = Card::from_fields(&[
            "PCOMP", "10", "", "", "", "", "", "", "SYM", "1", ".1", "0.", "YES", "", "", "45.", "",
            "2", ".2", "90.",
        ]);
        let props = Property::pcomp_from_card(&card).unwrap();
        let Property::Composite(p) = &props[0] else {
            panic!("expected PCOMP");
        };
        assert_eq!(p.plies.len(), 3);
        assert_eq!(p.plies[1].mid, 1);
        assert_eq!(p.plies[1].t, 0.1);
        assert_eq!(p.plies[1].theta, 45.0);
        assert_eq!(p.plies[2].mid, 2);
        assert_relative_eq!(p.total_thickness(), 0.8);
        assert_eq!(props[0].material_refs().len(), 3);
    }

    #[test]
    fn pelas_defines_two_properties() {
        let card = Card::from_fields(&["PELAS", "1", "100.", "", "", "2", "200."]);
        let props = Property::pelas_from_card(&card).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[1].id(), 2);
    }

    #[test]
    fn ptube_area_and_taper() {
        let card = Card::from_fields(&["PTUBE", "1", "2", "2.", ".5"]);
        let props = Property::ptube_from_card(&card).unwrap();
        assert_relative_eq!(props[0].section_area().unwrap(), PI / 4.0 * 3.0, epsilon = 1e-12);

        let bad = Card::from_fields(&["PTUBE", "1", "2", "2.", "1.5"]);
        assert!(Property::ptube_from_card(&bad).is_err());
    }

    #[test]
    fn property_families() {
        let shell = Property::pshell_from_card(&Card::from_fields(&["PSHELL", "1", "2", ".1"]))
            .unwrap()
            .remove(0);
        assert!(shell.accepts(ElementType::Cquad4));
        assert!(!shell.accepts(ElementType::Cbar));
        assert_eq!(shell.material_refs(), vec![("mid1".to_string(), 2)]);
    }
}

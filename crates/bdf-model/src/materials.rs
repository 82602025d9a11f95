//! Material cards: MAT1 (isotropic), MAT2, MAT3, MAT8 and MAT9.

use bdf_inp::{Card, FieldValue};

use crate::error::{ModelError, Result};
use crate::mesh::nonzero;

/// Isotropic material (MAT1)
#[derive(Debug, Clone, PartialEq)]
pub struct Mat1 {
    pub id: i32,
    /// Young's modulus after the completion rules
    pub e: f64,
    /// Shear modulus after the completion rules
    pub g: f64,
    /// Poisson's ratio after the completion rules
    pub nu: f64,
    pub rho: f64,
    pub a: f64,
    pub tref: f64,
    pub ge: f64,
    pub st: Option<f64>,
    pub sc: Option<f64>,
    pub ss: Option<f64>,
    pub mcsid: Option<i32>,
    /// E, G and NU as written on the card
    pub given: [Option<f64>; 3],
}

impl Mat1 {
    /// Create a MAT1 from E, G and NU, any of which may be absent.
    ///
    /// With E and G both given a missing NU is E/(2G) - 1; with one modulus
    /// and NU the other modulus follows from E = 2(1 + NU)G; with a single
    /// modulus and no NU the other values are zero.
    pub fn new(
        id: i32,
        e: Option<f64>,
        g: Option<f64>,
        nu: Option<f64>,
    ) -> Result<Self> {
        let present = |v: Option<f64>| v.filter(|v| *v != 0.0);
        let (e_full, g_full, nu_full) = match (present(e), present(g), nu) {
            (None, None, _) => {
                return Err(ModelError::InvalidMaterial {
                    id,
                    message: "E and G may not both be blank".to_string(),
                });
            }
            (Some(e), Some(g), Some(nu)) => (e, g, nu),
            (Some(e), Some(g), None) => (e, g, e / (2.0 * g) - 1.0),
            (Some(e), None, Some(nu)) => (e, e / (2.0 * (1.0 + nu)), nu),
            (Some(e), None, None) => (e, 0.0, 0.0),
            (None, Some(g), Some(nu)) => (2.0 * (1.0 + nu) * g, g, nu),
            (None, Some(g), None) => (0.0, g, 0.0),
        };
        Ok(Self {
            id,
            e: e_full,
            g: g_full,
            nu: nu_full,
            rho: 0.0,
            a: 0.0,
            tref: 0.0,
            ge: 0.0,
            st: None,
            sc: None,
            ss: None,
            mcsid: None,
            given: [e, g, nu],
        })
    }

    /// MAT1: `MID E G NU RHO A TREF GE; ST SC SS MCSID`
    pub fn from_card(card: &Card) -> Result<Self> {
        card.check_max_fields(13)?;
        let id = card.id(1, "mid")?;
        let mut mat = Self::new(
            id,
            card.real_or_none(2, "e")?,
            card.real_or_none(3, "g")?,
            card.real_or_none(4, "nu")?,
        )
        .map_err(|error| match error {
            ModelError::InvalidMaterial { message, .. } => card.validation(message).into(),
            other => other,
        })?;
        mat.rho = card.real_or_blank(5, "rho", 0.0)?;
        mat.a = card.real_or_blank(6, "a", 0.0)?;
        mat.tref = card.real_or_blank(7, "tref", 0.0)?;
        mat.ge = card.real_or_blank(8, "ge", 0.0)?;
        mat.st = card.real_or_none(9, "st")?;
        mat.sc = card.real_or_none(10, "sc")?;
        mat.ss = card.real_or_none(11, "ss")?;
        mat.mcsid = card.id_or_blank(12, "mcsid")?;
        Ok(mat)
    }

    /// Bulk modulus from E and NU
    pub fn bulk_modulus(&self) -> f64 {
        self.e / (3.0 * (1.0 - 2.0 * self.nu))
    }
}

/// 2-D anisotropic material (MAT2)
#[derive(Debug, Clone, PartialEq)]
pub struct Mat2 {
    pub id: i32,
    /// G11 G12 G13 G22 G23 G33
    pub g: [f64; 6],
    pub rho: f64,
    /// A1 A2 A3
    pub a: [f64; 3],
    pub tref: f64,
    pub ge: f64,
    pub st: Option<f64>,
    pub sc: Option<f64>,
    pub ss: Option<f64>,
    pub mcsid: Option<i32>,
}

/// Axisymmetric orthotropic material (MAT3)
#[derive(Debug, Clone, PartialEq)]
pub struct Mat3 {
    pub id: i32,
    pub ex: f64,
    pub eth: f64,
    pub ez: f64,
    pub nuxth: f64,
    pub nuthz: f64,
    pub nuzx: f64,
    pub rho: f64,
    pub gzx: f64,
    /// AX ATH AZ
    pub a: [f64; 3],
    pub tref: f64,
    pub ge: f64,
}

/// Shell orthotropic material (MAT8)
#[derive(Debug, Clone, PartialEq)]
pub struct Mat8 {
    pub id: i32,
    pub e1: f64,
    pub e2: f64,
    pub nu12: f64,
    pub g12: f64,
    pub g1z: f64,
    pub g2z: f64,
    pub rho: f64,
    pub a1: f64,
    pub a2: f64,
    pub tref: f64,
    /// Xt Xc Yt Yc S
    pub strength: [f64; 5],
    pub ge: f64,
    pub f12: f64,
    pub strn: f64,
}

/// 3-D anisotropic material (MAT9)
#[derive(Debug, Clone, PartialEq)]
pub struct Mat9 {
    pub id: i32,
    /// Upper triangle of the 6x6 matrix, row by row: G11..G16, G22..G26, ..., G66
    pub g: [f64; 21],
    pub rho: f64,
    /// A1..A6
    pub a: [f64; 6],
    pub tref: f64,
    pub ge: f64,
}

/// A material record.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Mat1(Mat1),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat8(Mat8),
    Mat9(Mat9),
}

impl Material {
    pub fn id(&self) -> i32 {
        match self {
            Material::Mat1(m) => m.id,
            Material::Mat2(m) => m.id,
            Material::Mat3(m) => m.id,
            Material::Mat8(m) => m.id,
            Material::Mat9(m) => m.id,
        }
    }

    pub fn card_name(&self) -> &'static str {
        match self {
            Material::Mat1(_) => "MAT1",
            Material::Mat2(_) => "MAT2",
            Material::Mat3(_) => "MAT3",
            Material::Mat8(_) => "MAT8",
            Material::Mat9(_) => "MAT9",
        }
    }

    /// Mass density
    pub fn rho(&self) -> f64 {
        match self {
            Material::Mat1(m) => m.rho,
            Material::Mat2(m) => m.rho,
            Material::Mat3(m) => m.rho,
            Material::Mat8(m) => m.rho,
            Material::Mat9(m) => m.rho,
        }
    }

    pub fn mat1_from_card(card: &Card) -> Result<Vec<Self>> {
        Ok(vec![Material::Mat1(Mat1::from_card(card)?)])
    }

    /// MAT2: `MID G11 G12 G13 G22 G23 G33 RHO; A1 A2 A3 TREF GE ST SC SS; MCSID`
    pub fn mat2_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(18)?;
        Ok(vec![Material::Mat2(Mat2 {
            id: card.id(1, "mid")?,
            g: reals(card, 2, "g")?,
            rho: card.real_or_blank(8, "rho", 0.0)?,
            a: reals(card, 9, "a")?,
            tref: card.real_or_blank(12, "tref", 0.0)?,
            ge: card.real_or_blank(13, "ge", 0.0)?,
            st: card.real_or_none(14, "st")?,
            sc: card.real_or_none(15, "sc")?,
            ss: card.real_or_none(16, "ss")?,
            mcsid: card.id_or_blank(17, "mcsid")?,
        })])
    }

    /// MAT3: `MID EX ETH EZ NUXTH NUTHZ NUZX RHO; - - GZX AX ATH AZ TREF GE`
    pub fn mat3_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(17)?;
        Ok(vec![Material::Mat3(Mat3 {
            id: card.id(1, "mid")?,
            ex: card.real(2, "ex")?,
            eth: card.real(3, "eth")?,
            ez: card.real(4, "ez")?,
            nuxth: card.real_or_blank(5, "nuxth", 0.0)?,
            nuthz: card.real_or_blank(6, "nuthz", 0.0)?,
            nuzx: card.real_or_blank(7, "nuzx", 0.0)?,
            rho: card.real_or_blank(8, "rho", 0.0)?,
            gzx: card.real_or_blank(11, "gzx", 0.0)?,
            a: reals(card, 12, "a")?,
            tref: card.real_or_blank(15, "tref", 0.0)?,
            ge: card.real_or_blank(16, "ge", 0.0)?,
        })])
    }

    /// MAT8: `MID E1 E2 NU12 G12 G1Z G2Z RHO; A1 A2 TREF Xt Xc Yt Yc S; GE F12 STRN`
    pub fn mat8_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(20)?;
        let mat = Mat8 {
            id: card.id(1, "mid")?,
            e1: card.real(2, "e1")?,
            e2: card.real(3, "e2")?,
            nu12: card.real(4, "nu12")?,
            g12: card.real_or_blank(5, "g12", 0.0)?,
            g1z: card.real_or_blank(6, "g1z", 1.0e8)?,
            g2z: card.real_or_blank(7, "g2z", 1.0e8)?,
            rho: card.real_or_blank(8, "rho", 0.0)?,
            a1: card.real_or_blank(9, "a1", 0.0)?,
            a2: card.real_or_blank(10, "a2", 0.0)?,
            tref: card.real_or_blank(11, "tref", 0.0)?,
            strength: reals(card, 12, "strength")?,
            ge: card.real_or_blank(17, "ge", 0.0)?,
            f12: card.real_or_blank(18, "f12", 0.0)?,
            strn: card.real_or_blank(19, "strn", 0.0)?,
        };
        if mat.e1 == 0.0 || mat.e2 == 0.0 {
            return Err(card.validation("E1 and E2 must be nonzero").into());
        }
        if mat.g12 == 0.0 && mat.g1z == 0.0 && mat.g2z == 0.0 && mat.nu12 == 0.0 {
            return Err(card
                .validation("G12, G1Z, G2Z and NU12 may not all be zero")
                .into());
        }
        Ok(vec![Material::Mat8(mat)])
    }

    /// MAT9: `MID G11..G16 G22; G23..G26 G33..G36; G44..G46 G55 G56 G66 RHO A1; A2..A6 TREF GE`
    pub fn mat9_from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(32)?;
        Ok(vec![Material::Mat9(Mat9 {
            id: card.id(1, "mid")?,
            g: reals(card, 2, "g")?,
            rho: card.real_or_blank(23, "rho", 0.0)?,
            a: reals(card, 24, "a")?,
            tref: card.real_or_blank(30, "tref", 0.0)?,
            ge: card.real_or_blank(31, "ge", 0.0)?,
        })])
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut f: Vec<FieldValue> = vec![self.card_name().into(), self.id().into()];
        match self {
            Material::Mat1(m) => {
                f.extend(m.given.map(FieldValue::from));
                f.extend([m.rho, m.a, m.tref, m.ge].map(FieldValue::from));
                f.extend([m.st, m.sc, m.ss].map(FieldValue::from));
                f.push(m.mcsid.map_or(FieldValue::Blank, nonzero));
            }
            Material::Mat2(m) => {
                f.extend(m.g.map(FieldValue::from));
                f.push(m.rho.into());
                f.extend(m.a.map(FieldValue::from));
                f.extend([m.tref, m.ge].map(FieldValue::from));
                f.extend([m.st, m.sc, m.ss].map(FieldValue::from));
                f.push(m.mcsid.into());
            }
            Material::Mat3(m) => {
                f.extend(
                    [m.ex, m.eth, m.ez, m.nuxth, m.nuthz, m.nuzx, m.rho].map(FieldValue::from),
                );
                f.extend([FieldValue::Blank, FieldValue::Blank, m.gzx.into()]);
                f.extend(m.a.map(FieldValue::from));
                f.extend([m.tref, m.ge].map(FieldValue::from));
            }
            Material::Mat8(m) => {
                f.extend(
                    [m.e1, m.e2, m.nu12, m.g12, m.g1z, m.g2z, m.rho, m.a1, m.a2, m.tref]
                        .map(FieldValue::from),
                );
                f.extend(m.strength.map(FieldValue::from));
                f.extend([m.ge, m.f12, m.strn].map(FieldValue::from));
            }
            Material::Mat9(m) => {
                f.extend(m.g.map(FieldValue::from));
                f.push(m.rho.into());
                f.extend(m.a.map(FieldValue::from));
                f.extend([m.tref, m.ge].map(FieldValue::from));
            }
        }
        f
    }
}

/// `N` consecutive reals from `first`, blank as zero.
fn reals<const N: usize>(card: &Card, first: usize, name: &str) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (k, value) in values.iter_mut().enumerate() {
        *value = card.real_or_blank(first + k, name, 0.0)?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bdf_inp::CardError;

    fn mat1(fields: &[&str]) -> Result<Mat1> {
        Mat1::from_card(&Card::from_fields(fields))
    }

    #[test]
    fn mat1_completion_rules() {
        let m = mat1(&["MAT1", "1", "3.+7", "", ".3"]).unwrap();
        assert_relative_eq!(m.g, 3.0e7 / 2.6);

        let m = mat1(&["MAT1", "1", "", "1.+7", ".25"]).unwrap();
        assert_relative_eq!(m.e, 2.5e7);

        let m = mat1(&["MAT1", "1", "2.6", "1."]).unwrap();
        assert_relative_eq!(m.nu, 0.3, epsilon = 1e-12);

        let m = mat1(&["MAT1", "1", "2.+5"]).unwrap();
        assert_eq!((m.g, m.nu), (0.0, 0.0));
    }

    #[test]
    fn mat1_needs_a_modulus() {
        let err = mat1(&["MAT1", "1", "", "", ".3"]).unwrap_err();
        assert!(err.to_string().contains("E and G"));
        assert!(mat1(&["MAT1", "1", "0.", "0.", ".3"]).is_err());
        assert!(matches!(err, ModelError::Card(CardError::Validation { .. })));

        let err = Mat1::new(4, None, Some(0.0), None).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidMaterial {
                id: 4,
                message: "E and G may not both be blank".to_string()
            }
        );
        assert!(Mat1::new(4, Some(2.0e5), None, Some(0.3)).is_ok());
    }

    #[test]
    fn mat1_writes_given_values_only() {
        let m = mat1(&["MAT1", "7", "3.+7", "", ".3", "7.8-9"]).unwrap();
        let fields = Material::Mat1(m).raw_fields();
        assert!(fields[3].is_blank());
        assert_eq!(fields[5], FieldValue::Real(7.8e-9));
    }

    #[test]
    fn mat8_validation() {
        let ok = Card::from_fields(&["MAT8", "2", "1.5+7", "1.+6", ".3", "5.+5"]);
        let mats = Material::mat8_from_card(&ok).unwrap();
        assert_eq!(mats[0].card_name(), "MAT8");

        let zero_e2 = Card::from_fields(&["MAT8", "2", "1.5+7", "0.", ".3"]);
        assert!(Material::mat8_from_card(&zero_e2).is_err());

        let no_shear = Card::from_fields(&["MAT8", "2", "1.5+7", "1.+6", "0.", "0.", "0.", "0."]);
        assert!(Material::mat8_from_card(&no_shear).is_err());
    }

    #[test]
    fn mat9_density_position() {
        let mut fields = vec!["MAT9".to_string(), "3".to_string()];
        fields.extend((0..21).map(|k| format!("{}.", k + 1)));
        fields.push("2.5".to_string());
        let mats = Material::mat9_from_card(&Card::from_fields(&fields)).unwrap();
        assert_eq!(mats[0].rho(), 2.5);
        let Material::Mat9(m) = &mats[0] else {
            panic!("expected MAT9")
        };
        assert_eq!(m.g[20], 21.0);
    }
}

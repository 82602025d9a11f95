//! PARAM cards.

use bdf_inp::{Card, FieldValue};

use crate::error::Result;

/// A named solution parameter with one or two values.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Upper-cased parameter name
    pub name: String,
    pub values: Vec<FieldValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// PARAM: `N V1 V2`
    pub fn from_card(card: &Card) -> Result<Vec<Self>> {
        card.check_max_fields(4)?;
        let name = card.string(1, "n")?;
        let mut values: Vec<FieldValue> = (2..4).map(|i| card.classify(i)).collect();
        while values.last().is_some_and(FieldValue::is_blank) {
            values.pop();
        }
        if values.is_empty() {
            return Err(card.validation(format!("PARAM {name} has no value")).into());
        }
        Ok(vec![Self { name, values }])
    }

    /// First value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.values.first().and_then(FieldValue::as_i64)
    }

    /// First value as a real; integers convert.
    pub fn as_f64(&self) -> Option<f64> {
        self.values.first().and_then(FieldValue::as_f64)
    }

    pub fn raw_fields(&self) -> Vec<FieldValue> {
        let mut fields = vec!["PARAM".into(), self.name.as_str().into()];
        fields.extend(self.values.iter().cloned());
        fields
    }
}

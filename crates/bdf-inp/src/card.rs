//! Assembled logical card and its typed field accessors.

use crate::error::{CardError, FieldError};
use crate::field::{self, FieldKind, FieldValue, FieldWidth};

/// Largest number of ids a single `A THRU B` range may add.
pub const MAX_THRU_SPAN: i64 = 1_000_000;

/// One logical bulk data card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Upper-cased card name without the large-field `*`.
    pub name: String,
    /// Raw trimmed field texts; index 0 is the card name.
    pub fields: Vec<String>,
    /// First physical line number (1-based, 0 for cards built in memory).
    pub line: usize,
    /// Original physical lines, empty for repeat copies and in-memory cards.
    pub lines: Vec<String>,
    /// Format of the first physical line.
    pub format: FieldWidth,
}

impl Card {
    /// Build a card from raw field texts; `fields[0]` is the card name.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        let mut fields: Vec<String> = fields
            .iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect();
        let name = fields
            .first()
            .map(|n| normalize_name(n))
            .unwrap_or_default();
        if let Some(first) = fields.first_mut() {
            *first = name.clone();
        }
        Self {
            name,
            fields,
            line: 0,
            lines: Vec::new(),
            format: FieldWidth::Free,
        }
    }

    /// Number of fields including the name.
    pub fn nfields(&self) -> usize {
        self.fields.len()
    }

    /// Raw text of a field, empty past the end of the card.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// True if the field is missing or blank.
    pub fn is_blank(&self, index: usize) -> bool {
        self.field(index).is_empty()
    }

    /// Type-inferred value of a field.
    pub fn classify(&self, index: usize) -> FieldValue {
        field::classify(self.field(index))
    }

    /// All fields after the name, type-inferred.
    pub fn raw_values(&self) -> Vec<FieldValue> {
        let mut values = vec![FieldValue::Text(self.name.clone())];
        values.extend(self.fields.iter().skip(1).map(|f| field::classify(f)));
        values
    }

    /// Decode a field as `kind`.
    pub fn value(&self, index: usize, kind: FieldKind, name: &str) -> Result<FieldValue, CardError> {
        field::decode(self.field(index), kind).map_err(|source| self.field_error(index, name, source))
    }

    /// Required integer.
    pub fn integer(&self, index: usize, name: &str) -> Result<i64, CardError> {
        self.integer_or_none(index, name)?
            .ok_or_else(|| self.missing(index, name))
    }

    /// Integer with a default for blank.
    pub fn integer_or_blank(&self, index: usize, name: &str, default: i64) -> Result<i64, CardError> {
        Ok(self.integer_or_none(index, name)?.unwrap_or(default))
    }

    /// Integer or `None` for blank.
    pub fn integer_or_none(&self, index: usize, name: &str) -> Result<Option<i64>, CardError> {
        Ok(self.value(index, FieldKind::Integer, name)?.as_i64())
    }

    /// Required positive identifier.
    pub fn id(&self, index: usize, name: &str) -> Result<i32, CardError> {
        let value = self.integer(index, name)?;
        match i32::try_from(value) {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(self.validation(format!(
                "field {index} '{name}' must be a positive id, got {value}"
            ))),
        }
    }

    /// Non-negative identifier or `None` for blank.
    pub fn id_or_blank(&self, index: usize, name: &str) -> Result<Option<i32>, CardError> {
        let value = self.value(index, FieldKind::IdOrBlank, name)?;
        match value.as_i64() {
            None => Ok(None),
            Some(v) => i32::try_from(v).map(Some).map_err(|_| {
                self.validation(format!("field {index} '{name}' id {v} is out of range"))
            }),
        }
    }

    /// Required real.
    pub fn real(&self, index: usize, name: &str) -> Result<f64, CardError> {
        self.real_or_none(index, name)?
            .ok_or_else(|| self.missing(index, name))
    }

    /// Real with a default for blank.
    pub fn real_or_blank(&self, index: usize, name: &str, default: f64) -> Result<f64, CardError> {
        Ok(self.real_or_none(index, name)?.unwrap_or(default))
    }

    /// Real or `None` for blank.
    pub fn real_or_none(&self, index: usize, name: &str) -> Result<Option<f64>, CardError> {
        Ok(self.value(index, FieldKind::Real, name)?.as_f64())
    }

    /// Required word.
    pub fn string(&self, index: usize, name: &str) -> Result<String, CardError> {
        self.string_or_blank(index, name)?
            .ok_or_else(|| self.missing(index, name))
    }

    /// Word or `None` for blank.
    pub fn string_or_blank(&self, index: usize, name: &str) -> Result<Option<String>, CardError> {
        Ok(self
            .value(index, FieldKind::String, name)?
            .as_str()
            .map(str::to_string))
    }

    /// Degree-of-freedom components such as `123456`, or `None` for blank.
    ///
    /// Digits must be unique and in `0..=6`.
    pub fn components_or_blank(&self, index: usize, name: &str) -> Result<Option<String>, CardError> {
        let Some(value) = self.integer_or_none(index, name)? else {
            return Ok(None);
        };
        let text = value.to_string();
        let mut seen = [false; 7];
        for ch in text.chars() {
            let digit = ch.to_digit(10).filter(|d| *d <= 6).ok_or_else(|| {
                self.validation(format!("field {index} '{name}' has invalid component {ch}"))
            })? as usize;
            if seen[digit] {
                return Err(self.validation(format!(
                    "field {index} '{name}' repeats component {digit}"
                )));
            }
            seen[digit] = true;
        }
        Ok(Some(text))
    }

    /// Required components.
    pub fn components(&self, index: usize, name: &str) -> Result<String, CardError> {
        self.components_or_blank(index, name)?
            .ok_or_else(|| self.missing(index, name))
    }

    /// Ids from `start` to the end of the card, expanding `A THRU B` ranges.
    pub fn ids_with_thru(&self, start: usize, name: &str) -> Result<Vec<i32>, CardError> {
        let mut ids = Vec::new();
        let mut index = start;
        while index < self.nfields() {
            if self.is_blank(index) {
                index += 1;
                continue;
            }
            if self.field(index).eq_ignore_ascii_case("THRU") {
                let first = *ids
                    .last()
                    .ok_or_else(|| self.validation(format!("THRU at field {index} has no start")))?;
                let last = self.id(index + 1, name)?;
                if last < first {
                    return Err(self.validation(format!(
                        "THRU range {first} to {last} is descending"
                    )));
                }
                let span = i64::from(last) - i64::from(first);
                if span > MAX_THRU_SPAN {
                    return Err(self.validation(format!(
                        "THRU range {first} to {last} spans more than {MAX_THRU_SPAN} ids"
                    )));
                }
                ids.extend((first..=last).skip(1));
                index += 2;
                continue;
            }
            ids.push(self.id(index, name)?);
            index += 1;
        }
        Ok(ids)
    }

    /// Fail if any non-blank field sits at or past `max` fields.
    pub fn check_max_fields(&self, max: usize) -> Result<(), CardError> {
        match (max..self.nfields()).find(|i| !self.is_blank(*i)) {
            Some(index) => Err(self.validation(format!(
                "has {} fields, at most {max} allowed (field {index} = {:?})",
                self.nfields(),
                self.field(index)
            ))),
            None => Ok(()),
        }
    }

    /// Fail unless the card has at least `min` fields.
    pub fn check_min_fields(&self, min: usize) -> Result<(), CardError> {
        if self.nfields() < min {
            return Err(self.validation(format!(
                "has {} fields, at least {min} required",
                self.nfields()
            )));
        }
        Ok(())
    }

    /// Build a validation error for this card.
    pub fn validation(&self, message: impl Into<String>) -> CardError {
        CardError::Validation {
            card: self.name.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    fn missing(&self, index: usize, name: &str) -> CardError {
        self.validation(format!("missing required field {index} '{name}'"))
    }

    fn field_error(&self, index: usize, name: &str, source: FieldError) -> CardError {
        CardError::Field {
            card: self.name.clone(),
            line: self.line,
            index,
            name: name.to_string(),
            source,
        }
    }
}

/// Upper-case a card name and drop the large-field `*` suffix.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().trim_end_matches('*').trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Card {
        Card::from_fields(&["grid*", "10", "", "1.", "2.5-1", "-3", "", "", ""])
    }

    #[test]
    fn normalizes_name() {
        let card = grid();
        assert_eq!(card.name, "GRID");
        assert_eq!(card.field(0), "GRID");
    }

    #[test]
    fn typed_accessors_apply_defaults() {
        let card = grid();
        assert_eq!(card.id(1, "nid"), Ok(10));
        assert_eq!(card.id_or_blank(2, "cp"), Ok(None));
        assert_eq!(card.real(3, "x1"), Ok(1.0));
        assert_eq!(card.real(4, "x2"), Ok(0.25));
        assert_eq!(card.real(5, "x3"), Ok(-3.0));
        assert_eq!(card.real_or_blank(20, "missing", 7.0), Ok(7.0));
    }

    #[test]
    fn missing_required_field_is_a_validation_error() {
        let card = grid();
        let err = card.real(6, "x4").unwrap_err();
        assert!(matches!(err, CardError::Validation { .. }));
        assert!(err.to_string().contains("x4"));
    }

    #[test]
    fn decode_error_carries_context() {
        let card = Card::from_fields(&["GRID", "abc"]);
        let err = card.id(1, "nid").unwrap_err();
        match err {
            CardError::Field { card, index, name, .. } => {
                assert_eq!(card, "GRID");
                assert_eq!(index, 1);
                assert_eq!(name, "nid");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn thru_ranges_expand() {
        let card = Card::from_fields(&["SPC1", "1", "123", "5", "THRU", "8", "12"]);
        assert_eq!(card.ids_with_thru(3, "nid"), Ok(vec![5, 6, 7, 8, 12]));
    }

    #[test]
    fn thru_range_ending_at_the_largest_id() {
        let card = Card::from_fields(&["SPC1", "1", "1", "2147483646", "THRU", "2147483647"]);
        assert_eq!(
            card.ids_with_thru(3, "nid"),
            Ok(vec![2147483646, 2147483647])
        );
        let card = Card::from_fields(&["SPC1", "1", "1", "2147483647", "THRU", "2147483647"]);
        assert_eq!(card.ids_with_thru(3, "nid"), Ok(vec![2147483647]));
    }

    #[test]
    fn huge_thru_range_is_rejected() {
        let card = Card::from_fields(&["SPC1", "1", "1", "1", "THRU", "2000000000"]);
        assert!(matches!(
            card.ids_with_thru(3, "nid"),
            Err(CardError::Validation { .. })
        ));
    }

    #[test]
    fn components_must_be_unique_digits() {
        let card = Card::from_fields(&["SPC1", "1", "123456", "1231", "7"]);
        assert_eq!(card.components(2, "c"), Ok("123456".to_string()));
        assert!(card.components(3, "c").is_err());
        assert!(card.components(4, "c").is_err());
    }

    #[test]
    fn extra_fields_are_checked() {
        let card = Card::from_fields(&["PELAS", "1", "2.", "", "", "", ""]);
        assert!(card.check_max_fields(4).is_ok());
        let card = Card::from_fields(&["PELAS", "1", "2.", "", "", "9"]);
        assert!(card.check_max_fields(4).is_err());
    }
}

//! Field codec for NASTRAN bulk data.
//!
//! Decoding turns one raw field (8 or 16 columns, or a comma token) into a
//! typed [`FieldValue`]. Encoding renders a value right-justified into the
//! target width. Reals use the NASTRAN conventions in both directions:
//!
//! ```text
//! 2.56-4   == 2.56e-4     (sign replaces the exponent letter)
//! 1.+8     == 1.0e8
//! -5.-3    == -0.005      (leading sign is the value sign, the second the exponent)
//! .5       == 0.5         (leading zero dropped when writing)
//! ```

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Largest number of significant digits tried when shrinking a real.
const MAX_SIGNIFICANT_DIGITS: usize = 17;

/// Declared type of a field in a card layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Signed integer.
    Integer,
    /// Real number (integer text is accepted).
    Real,
    /// Alphanumeric word.
    String,
    /// Non-negative identifier or blank.
    IdOrBlank,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Integer => "integer",
            FieldKind::Real => "real",
            FieldKind::String => "string",
            FieldKind::IdOrBlank => "id or blank",
        };
        f.write_str(name)
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum FieldValue {
    /// Empty field. Distinct from zero: the card layout decides the default.
    #[default]
    Blank,
    /// Integer value.
    Integer(i64),
    /// Real value.
    Real(f64),
    /// Upper-cased word.
    Text(String),
}

impl FieldValue {
    /// True for the blank sentinel.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Blank)
    }

    /// Integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload; integers widen to reals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Blank => Ok(()),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => match format_real(*v, None) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{v}"),
            },
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Blank, Into::into)
    }
}

/// Field width convention of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldWidth {
    /// 8-character fields.
    #[default]
    Small,
    /// 16-character fields, two physical lines per logical row.
    Large,
    /// Comma-delimited fields.
    Free,
}

impl FieldWidth {
    /// Number of columns per field, `None` for free field.
    pub fn columns(self) -> Option<usize> {
        match self {
            FieldWidth::Small => Some(8),
            FieldWidth::Large => Some(16),
            FieldWidth::Free => None,
        }
    }
}

/// Decode one raw field as `kind`.
pub fn decode(raw: &str, kind: FieldKind) -> Result<FieldValue, FieldError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(FieldValue::Blank);
    }
    let error = || FieldError::Decode {
        text: text.to_string(),
        expected: kind,
    };

    match kind {
        FieldKind::Integer => parse_integer(text)
            .map(FieldValue::Integer)
            .ok_or_else(error),
        FieldKind::IdOrBlank => match parse_integer(text) {
            Some(v) if v >= 0 => Ok(FieldValue::Integer(v)),
            _ => Err(error()),
        },
        FieldKind::Real => parse_real(text).map(FieldValue::Real).ok_or_else(error),
        FieldKind::String => {
            if parse_real(text).is_some() {
                Err(error())
            } else {
                Ok(FieldValue::Text(text.to_ascii_uppercase()))
            }
        }
    }
}

/// Infer the type of a raw field: integer, real, text or blank.
pub fn classify(raw: &str) -> FieldValue {
    let text = raw.trim();
    if text.is_empty() {
        FieldValue::Blank
    } else if let Some(v) = parse_integer(text) {
        FieldValue::Integer(v)
    } else if let Some(v) = parse_real(text) {
        FieldValue::Real(v)
    } else {
        FieldValue::Text(text.to_ascii_uppercase())
    }
}

/// Parse an optionally signed run of decimal digits.
pub fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parse a NASTRAN real.
///
/// Grammar: `[sign] digits* [. digits*] [exponent]` with at least one mantissa
/// digit, where the exponent is either `E|e|D|d [sign] digits` or a bare
/// `sign digits` directly after the mantissa.
pub fn parse_real(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0usize;

    let negative = match bytes.first() {
        Some(b'-') => {
            i = 1;
            true
        }
        Some(b'+') => {
            i = 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &text[int_start..i];

    let mut frac_digits = "";
    if i < len && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = &text[frac_start..i];
    }
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let exponent = if i < len {
        match bytes[i] {
            b'E' | b'e' | b'D' | b'd' => parse_exponent(&text[i + 1..])?,
            b'+' | b'-' => parse_exponent(&text[i..])?,
            _ => return None,
        }
    } else {
        0
    };

    let canonical = format!(
        "{}{}.{}e{}",
        if negative { "-" } else { "" },
        if int_digits.is_empty() { "0" } else { int_digits },
        if frac_digits.is_empty() { "0" } else { frac_digits },
        exponent
    );
    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_exponent(text: &str) -> Option<i32> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Encode a value right-justified into `width`.
pub fn encode(value: &FieldValue, width: FieldWidth) -> Result<String, FieldError> {
    let columns = width.columns();
    let body = match value {
        FieldValue::Blank => String::new(),
        FieldValue::Integer(v) => v.to_string(),
        FieldValue::Real(v) => format_real(*v, columns)?,
        FieldValue::Text(s) => s.clone(),
    };

    match columns {
        None => Ok(body),
        Some(cols) => {
            if body.len() > cols {
                return Err(FieldError::Overflow {
                    value: body,
                    width: cols,
                });
            }
            Ok(format!("{body:>cols$}"))
        }
    }
}

/// Render a real in at most `max_len` characters (unbounded for `None`).
///
/// Tries the exact fixed form, then the exact compact exponent form, then
/// drops significant digits one at a time until a form fits.
pub fn format_real(value: f64, max_len: Option<usize>) -> Result<String, FieldError> {
    if !value.is_finite() {
        return Err(FieldError::Overflow {
            value: value.to_string(),
            width: max_len.unwrap_or(0),
        });
    }
    if value == 0.0 {
        return Ok("0.".to_string());
    }

    let fixed = compact_fixed(&format!("{value}"));
    let exponent = compact_exponent(&format!("{value:e}"));

    let Some(limit) = max_len else {
        return Ok(if exponent.len() < fixed.len() {
            exponent
        } else {
            fixed
        });
    };

    if fixed.len() <= limit {
        return Ok(fixed);
    }
    if exponent.len() <= limit {
        return Ok(exponent);
    }

    for digits in (1..=MAX_SIGNIFICANT_DIGITS).rev() {
        let candidates = [
            fixed_with_digits(value, digits),
            Some(compact_exponent(&format!("{:.*e}", digits - 1, value))),
        ];
        let best = candidates
            .into_iter()
            .flatten()
            .filter(|c| c.len() <= limit)
            .min_by_key(|c| c.len());
        if let Some(best) = best {
            return Ok(best);
        }
    }

    Err(FieldError::Overflow {
        value: exponent,
        width: limit,
    })
}

fn fixed_with_digits(value: f64, digits: usize) -> Option<String> {
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = digits as i32 - 1 - magnitude;
    if !(0..=340).contains(&decimals) {
        return None;
    }
    Some(compact_fixed(&format!("{:.*}", decimals as usize, value)))
}

/// `0.500` -> `.5`, `-0.25` -> `-.25`, `100` -> `100.`
fn compact_fixed(text: &str) -> String {
    let mut out = text.to_string();
    if out.contains('.') {
        let trimmed = out.trim_end_matches('0').len();
        out.truncate(trimmed);
    } else {
        out.push('.');
    }
    if let Some(rest) = out.strip_prefix("0.") {
        out = format!(".{rest}");
    } else if let Some(rest) = out.strip_prefix("-0.") {
        out = format!("-.{rest}");
    }
    out
}

/// `2.56e-4` -> `2.56-4`, `1e8` -> `1.+8`
fn compact_exponent(text: &str) -> String {
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text, "0"));
    let mut mantissa = mantissa.to_string();
    if mantissa.contains('.') {
        let trimmed = mantissa.trim_end_matches('0').len();
        mantissa.truncate(trimmed);
    } else {
        mantissa.push('.');
    }
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{sign}{}", exponent.unsigned_abs())
}

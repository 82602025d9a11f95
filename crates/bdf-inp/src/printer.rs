//! Card printer: field values to physical lines.

use crate::error::FieldError;
use crate::field::{self, FieldValue, FieldWidth};

/// Fields per physical line after the leading field.
fn per_row(width: FieldWidth) -> usize {
    match width {
        FieldWidth::Large => 4,
        FieldWidth::Small | FieldWidth::Free => 8,
    }
}

/// Print one card. `values[0]` is the card name.
///
/// Trailing blank fields are dropped. Continuation lines carry a `+` (small)
/// or `*` (large) leading field, free field rows start with a comma. Every
/// line ends with `\n` and carries no trailing whitespace.
pub fn print_card(values: &[FieldValue], width: FieldWidth) -> Result<String, FieldError> {
    let name = values.first().map(|v| v.to_string()).unwrap_or_default();
    let end = values
        .iter()
        .rposition(|v| !v.is_blank())
        .map_or(1, |i| i + 1)
        .max(1);
    let data = values.get(1..end).unwrap_or(&[]);

    let mut out = String::new();
    let rows: Vec<&[FieldValue]> = if data.is_empty() {
        vec![&[]]
    } else {
        data.chunks(per_row(width)).collect()
    };

    for (row_index, row) in rows.into_iter().enumerate() {
        let first = row_index == 0;
        let line = match width {
            FieldWidth::Free => free_row(&name, row, first)?,
            FieldWidth::Small | FieldWidth::Large => fixed_row(&name, row, first, width)?,
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    Ok(out)
}

fn fixed_row(
    name: &str,
    row: &[FieldValue],
    first: bool,
    width: FieldWidth,
) -> Result<String, FieldError> {
    let lead = match (first, width) {
        (true, FieldWidth::Large) => format!("{name}*"),
        (true, _) => name.to_string(),
        (false, FieldWidth::Large) => "*".to_string(),
        (false, _) => "+".to_string(),
    };
    if lead.len() > 8 {
        return Err(FieldError::Overflow {
            value: lead,
            width: 8,
        });
    }

    let mut line = format!("{lead:<8}");
    for value in row {
        line.push_str(&field::encode(value, width)?);
    }
    Ok(line)
}

fn free_row(name: &str, row: &[FieldValue], first: bool) -> Result<String, FieldError> {
    let mut line = if first { name.to_string() } else { String::new() };
    let used = row
        .iter()
        .rposition(|v| !v.is_blank())
        .map_or(0, |i| i + 1);
    if !first && used == 0 {
        line.push(',');
    }
    for value in &row[..used] {
        line.push(',');
        line.push_str(&field::encode(value, FieldWidth::Free)?);
    }
    Ok(line)
}

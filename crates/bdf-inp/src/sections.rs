//! Executive and case control sections in front of the bulk data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InpError;
use crate::source::LineSource;

/// Lines preceding the bulk data, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDecks {
    /// Executive control lines, including the `CEND` line.
    pub executive_control: Vec<String>,
    /// Case control lines, including the `BEGIN BULK` line.
    pub case_control: Vec<String>,
}

impl ControlDecks {
    /// True when the deck had no control sections (punch file).
    pub fn is_empty(&self) -> bool {
        self.executive_control.is_empty() && self.case_control.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Executive,
    Case,
}

/// Read the control sections, leaving `source` at the first bulk data line.
///
/// Returns the sections and the number of lines consumed. With `punch` the
/// deck is bulk data only and nothing is read.
pub fn read_control_decks<S: LineSource>(
    source: &mut S,
    punch: bool,
) -> Result<(ControlDecks, usize), InpError> {
    let mut decks = ControlDecks::default();
    if punch {
        return Ok((decks, 0));
    }

    let mut section = Section::Executive;
    let mut consumed = 0usize;
    while let Some(line) = source.next_line()? {
        consumed += 1;
        let upper = line.trim().to_ascii_uppercase();
        let begins_bulk = is_begin_bulk(&upper);
        match section {
            Section::Executive => {
                if begins_bulk {
                    decks.executive_control.push(line);
                    debug!(lines = consumed, "no case control section");
                    return Ok((decks, consumed));
                }
                let is_cend = upper.starts_with("CEND");
                decks.executive_control.push(line);
                if is_cend {
                    section = Section::Case;
                }
            }
            Section::Case => {
                decks.case_control.push(line);
                if begins_bulk {
                    debug!(
                        executive = decks.executive_control.len(),
                        case = decks.case_control.len(),
                        "control sections read"
                    );
                    return Ok((decks, consumed));
                }
            }
        }
    }

    let missing = match section {
        Section::Executive => "CEND or BEGIN BULK",
        Section::Case => "BEGIN BULK",
    };
    Err(InpError::syntax(consumed, format!("end of input before {missing}")))
}

fn is_begin_bulk(upper: &str) -> bool {
    upper
        .strip_prefix("BEGIN")
        .is_some_and(|rest| rest.trim_start().starts_with("BULK"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StrLines;

    #[test]
    fn splits_executive_and_case_control() {
        let text = "SOL 101\nCEND\nSUBCASE 1\n  LOAD = 100\nBEGIN BULK\nGRID,1\n";
        let mut src = StrLines::new(text);
        let (decks, consumed) = read_control_decks(&mut src, false).unwrap();
        assert_eq!(decks.executive_control, vec!["SOL 101", "CEND"]);
        assert_eq!(
            decks.case_control,
            vec!["SUBCASE 1", "  LOAD = 100", "BEGIN BULK"]
        );
        assert_eq!(consumed, 5);
        assert_eq!(src.next_line().unwrap().as_deref(), Some("GRID,1"));
    }

    #[test]
    fn begin_bulk_without_cend() {
        let mut src = StrLines::new("$ header\nBEGIN BULK\nGRID,1\n");
        let (decks, consumed) = read_control_decks(&mut src, false).unwrap();
        assert_eq!(decks.executive_control.len(), 2);
        assert!(decks.case_control.is_empty());
        assert_eq!(consumed, 2);
    }

    #[test]
    fn punch_reads_nothing() {
        let mut src = StrLines::new("GRID,1\n");
        let (decks, consumed) = read_control_decks(&mut src, true).unwrap();
        assert!(decks.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn missing_begin_bulk_is_an_error() {
        let mut src = StrLines::new("SOL 101\nCEND\nSUBCASE 1\n");
        let err = read_control_decks(&mut src, false).unwrap_err();
        assert!(err.to_string().contains("BEGIN BULK"));
    }
}

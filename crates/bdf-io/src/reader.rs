//! Deck reading pipeline: control sections, card assembly, entity
//! construction and the optional cross-reference pass.

use std::collections::BTreeSet;
use std::path::Path;

use bdf_inp::{
    AssemblerOptions, CardAssembler, CardEvent, LineSource, StrLines, read_control_decks,
};
use bdf_model::{BdfModel, CardRegistry, ReadConfig, XrefMode};
use tracing::{debug, info, warn};

use crate::error::{IoError, Result};
use crate::include::IncludeLines;

/// Reading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// The deck is bulk data only, without control sections.
    pub punch: bool,
    /// Abort on malformed lines and on cards that fail to construct.
    pub strict: bool,
    /// Cross-reference mode run after reading; `None` skips the pass.
    pub xref: Option<XrefMode>,
    /// Card names kept as rejects even when they could be constructed.
    pub skip_cards: BTreeSet<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            punch: false,
            strict: false,
            xref: Some(XrefMode::Safe),
            skip_cards: BTreeSet::new(),
        }
    }
}

impl ReadOptions {
    pub fn punch(mut self, punch: bool) -> Self {
        self.punch = punch;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn xref(mut self, xref: Option<XrefMode>) -> Self {
        self.xref = xref;
        self
    }

    pub fn skip_card(mut self, name: &str) -> Self {
        self.skip_cards.insert(name.trim().to_ascii_uppercase());
        self
    }
}

/// Reads decks into [`BdfModel`]s.
#[derive(Debug, Clone)]
pub struct BdfReader {
    options: ReadOptions,
    registry: CardRegistry,
}

impl Default for BdfReader {
    fn default() -> Self {
        Self::new(ReadOptions::default())
    }
}

impl BdfReader {
    pub fn new(options: ReadOptions) -> Self {
        let config = options
            .skip_cards
            .iter()
            .fold(ReadConfig::default(), |config, name| config.skip_card(name));
        Self {
            options,
            registry: CardRegistry::new(config),
        }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Constructor table, for registering additional cards.
    pub fn registry_mut(&mut self) -> &mut CardRegistry {
        &mut self.registry
    }

    /// Read a deck file, expanding its includes.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<BdfModel> {
        let path = path.as_ref();
        info!(path = %path.display(), "reading bulk data file");
        let lines = IncludeLines::open(path)?;
        if lines.files().len() > 1 {
            debug!(files = lines.files().len(), "includes expanded");
        }
        self.read_source(lines)
    }

    /// Read a deck held in memory. `INCLUDE` lines are not expanded.
    pub fn read_str(&self, text: &str) -> Result<BdfModel> {
        self.read_source(StrLines::new(text))
    }

    /// Read a deck from any line source.
    pub fn read_source<S: LineSource>(&self, mut source: S) -> Result<BdfModel> {
        let (decks, consumed) = read_control_decks(&mut source, self.options.punch)?;
        debug!(
            executive = decks.executive_control.len(),
            case = decks.case_control.len(),
            "control sections"
        );

        let mut model = BdfModel::new();
        model.executive_control = decks.executive_control;
        model.case_control = decks.case_control;

        let options = AssemblerOptions::default().strict(self.options.strict);
        let mut assembler = CardAssembler::with_options(source, options).with_line_offset(consumed);
        let mut cards = 0usize;
        let mut failed = 0usize;
        let mut ended = false;
        while let Some(event) = assembler.next_card()? {
            let card = match event {
                CardEvent::Card(card) => card,
                CardEvent::Blank => continue,
                CardEvent::EndData => {
                    ended = true;
                    break;
                }
            };
            cards += 1;
            if let Err(error) = model.add_card(&card, &self.registry) {
                if self.options.strict {
                    return Err(IoError::Card {
                        line: card.line,
                        card: card.name.clone(),
                        source: error,
                    });
                }
                failed += 1;
                model.push_parse_error(error);
            }
        }
        if !ended {
            debug!("bulk data ended without ENDDATA");
        }
        info!(
            cards,
            failed,
            rejects = model.rejects().len(),
            nodes = model.nodes().len(),
            elements = model.elements().len(),
            "bulk data read"
        );

        if let Some(mode) = self.options.xref {
            let report = model.cross_reference(mode)?;
            if report.errors > 0 {
                warn!(errors = report.errors, "cross-reference found problems");
            }
        }
        Ok(model)
    }
}

/// Read a deck file with `options`.
pub fn read_bdf(path: impl AsRef<Path>, options: &ReadOptions) -> Result<BdfModel> {
    BdfReader::new(options.clone()).read_file(path)
}

/// Read an in-memory deck with `options`.
pub fn read_str(text: &str, options: &ReadOptions) -> Result<BdfModel> {
    BdfReader::new(options.clone()).read_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdf_model::ModelError;

    const DECK: &str = "\
SOL 101
CEND
SUBCASE 1
  SPC = 1
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
CROD,10,20,1,2
PROD,20,30,2.
MAT1,30,2.+5,,.3,3.
SPC1,1,123,1
ENDDATA
";

    #[test]
    fn reads_sections_and_cards() {
        let model = read_str(DECK, &ReadOptions::default()).unwrap();
        assert_eq!(model.executive_control, vec!["SOL 101", "CEND"]);
        assert_eq!(model.case_control.len(), 3);
        assert_eq!(model.nodes().len(), 2);
        assert_eq!(model.elements().len(), 1);
        assert!(model.is_cross_referenced());
        assert_eq!(model.spc_set(1).len(), 1);
    }

    #[test]
    fn xref_can_be_skipped() {
        let model = read_str(DECK, &ReadOptions::default().xref(None)).unwrap();
        assert!(!model.is_cross_referenced());
    }

    #[test]
    fn punch_decks_have_no_control_sections() {
        let deck = "GRID,1,,0.,0.,0.\nCAERO1,1\n";
        let model = read_str(deck, &ReadOptions::default().punch(true)).unwrap();
        assert!(model.executive_control.is_empty());
        assert_eq!(model.rejects().len(), 1);
    }

    #[test]
    fn bad_cards_are_queued_in_safe_mode() {
        let deck = "BEGIN BULK\nGRID,1,,0.,0.,0.\nGRID,x,,0.,0.,0.\nGRID,1,,5.,0.,0.\n";
        let mut model = read_str(deck, &ReadOptions::default()).unwrap();
        let errors = model.pop_parse_errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ModelError::Card(_)));
        assert!(matches!(errors[1], ModelError::DuplicateEntity { .. }));
        assert_eq!(model.nodes().len(), 1);
    }

    #[test]
    fn bad_cards_abort_in_strict_mode() {
        let deck = "BEGIN BULK\nGRID,1,,0.,0.,0.\nGRID,x,,0.,0.,0.\n";
        let err = read_str(deck, &ReadOptions::default().strict(true)).unwrap_err();
        match err {
            IoError::Card { line, card, .. } => {
                assert_eq!(line, 3);
                assert_eq!(card, "GRID");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn skipped_cards_become_rejects() {
        let options = ReadOptions::default().skip_card("crod").xref(None);
        let model = read_str(DECK, &options).unwrap();
        assert!(model.elements().is_empty());
        assert_eq!(model.rejects()[0].name, "CROD");
    }

    #[test]
    fn missing_begin_bulk_is_a_syntax_error() {
        let err = read_str("SOL 101\nCEND\n", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Inp(_)));
    }
}

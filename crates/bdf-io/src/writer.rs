//! Deck writer and summary export.
//!
//! Output order is executive control, case control, then the bulk data
//! sections (params, nodes, elements, properties, materials, loads, SPCs,
//! MPCs, rejects, coordinate systems) and `ENDDATA`. Each non-empty bulk
//! section starts with a `$` header line.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use bdf_inp::{END_DATA, FieldValue, FieldWidth, print_card};
use bdf_model::{BdfModel, Category, ModelError, ModelSummary, Reject};
use tracing::{debug, info};

use crate::error::Result;

fn section_header(category: Category) -> &'static str {
    match category {
        Category::Param => "$PARAMS",
        Category::Node => "$NODES",
        Category::Coord => "$COORDS",
        Category::Element => "$ELEMENTS",
        Category::Property => "$PROPERTIES",
        Category::Material => "$MATERIALS",
        Category::LoadSet => "$LOADS",
        Category::SpcSet | Category::SpcAdd => "$SPCS",
        Category::MpcSet | Category::MpcAdd => "$MPCS",
    }
}

/// Writing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub width: FieldWidth,
    /// Write every CQUAD4 as two CTRIA3, see [`BdfModel::with_quads_as_trias`].
    pub quads_as_trias: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new(FieldWidth::Small)
    }
}

impl WriteOptions {
    pub fn new(width: FieldWidth) -> Self {
        Self {
            width,
            quads_as_trias: false,
        }
    }

    pub fn quads_as_trias(mut self, quads_as_trias: bool) -> Self {
        self.quads_as_trias = quads_as_trias;
        self
    }
}

/// Write `model` as a deck with fields of `width`.
pub fn write_bdf<W: Write>(model: &BdfModel, out: &mut W, width: FieldWidth) -> Result<()> {
    write_bdf_with(model, out, &WriteOptions::new(width))
}

/// Write `model` as a deck with `options`.
pub fn write_bdf_with<W: Write>(model: &BdfModel, out: &mut W, options: &WriteOptions) -> Result<()> {
    if options.quads_as_trias {
        let split = model.with_quads_as_trias()?;
        return write_deck(&split, out, options.width);
    }
    write_deck(model, out, options.width)
}

fn write_deck<W: Write>(model: &BdfModel, out: &mut W, width: FieldWidth) -> Result<()> {
    for line in model.executive_control.iter().chain(&model.case_control) {
        writeln!(out, "{line}")?;
    }

    let mut current: Option<&str> = None;
    let mut cards = 0usize;
    let mut rejects_written = false;
    for (category, fields) in model.entities() {
        // rejects go between the constraints and the coordinate systems
        if category == Category::Coord && !rejects_written {
            write_rejects(out, model, width)?;
            rejects_written = true;
        }
        let header = section_header(category);
        if current != Some(header) {
            writeln!(out, "{header}")?;
            current = Some(header);
        }
        let text = print_card(&fields, width).map_err(ModelError::from)?;
        out.write_all(text.as_bytes())?;
        cards += 1;
    }

    if !rejects_written {
        write_rejects(out, model, width)?;
    }
    writeln!(out, "{END_DATA}")?;
    debug!(cards, rejects = model.rejects().len(), "deck written");
    Ok(())
}

fn write_rejects<W: Write>(out: &mut W, model: &BdfModel, width: FieldWidth) -> Result<()> {
    if model.rejects().is_empty() {
        return Ok(());
    }
    writeln!(out, "$REJECTS")?;
    for reject in model.rejects() {
        write_reject(out, reject, width)?;
    }
    Ok(())
}

/// Original lines when the card has them, otherwise its fields.
fn write_reject<W: Write>(out: &mut W, reject: &Reject, width: FieldWidth) -> Result<()> {
    if !reject.lines.is_empty() {
        for line in &reject.lines {
            writeln!(out, "{line}")?;
        }
        return Ok(());
    }
    let values: Vec<FieldValue> = reject
        .fields
        .iter()
        .map(|text| match text.trim() {
            "" => FieldValue::Blank,
            text => FieldValue::from(text),
        })
        .collect();
    let width = if width == FieldWidth::Small && reject.fields.iter().any(|f| f.trim().len() > 8) {
        FieldWidth::Large
    } else {
        width
    };
    let text = print_card(&values, width).map_err(ModelError::from)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// The deck as a string.
pub fn to_string(model: &BdfModel, width: FieldWidth) -> Result<String> {
    to_string_with(model, &WriteOptions::new(width))
}

pub fn to_string_with(model: &BdfModel, options: &WriteOptions) -> Result<String> {
    let mut out = Vec::new();
    write_bdf_with(model, &mut out, options)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write the deck to `path`, creating parent directories.
pub fn write_bdf_file(model: &BdfModel, path: impl AsRef<Path>, width: FieldWidth) -> Result<()> {
    write_bdf_file_with(model, path, &WriteOptions::new(width))
}

pub fn write_bdf_file_with(model: &BdfModel, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    write_bdf_with(model, &mut out, options)?;
    out.flush()?;
    info!(path = %path.display(), "bulk data file written");
    Ok(())
}

/// Write the [`ModelSummary`] of `model` as pretty-printed JSON.
pub fn write_summary_json(model: &BdfModel, path: impl AsRef<Path>) -> Result<()> {
    let summary = ModelSummary::from_model(model);
    let out = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(out, &summary)?;
    Ok(())
}

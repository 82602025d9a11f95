//! File and string I/O for NASTRAN bulk data decks.
//!
//! - [`BdfReader`] / [`read_bdf`]: control sections, card assembly, entity
//!   construction and cross-referencing in one pass
//! - [`IncludeLines`]: `INCLUDE` expansion with cycle detection
//! - [`write_bdf`] / [`write_bdf_with`]: deterministic deck output in small,
//!   large or free field, optionally with quads split into triangles
//! - [`write_summary_json`]: JSON export of the model summary

pub mod error;
pub mod include;
pub mod reader;
pub mod writer;

pub use error::{IoError, Result};
pub use include::IncludeLines;
pub use reader::{BdfReader, ReadOptions, read_bdf, read_str};
pub use writer::{
    WriteOptions, to_string, to_string_with, write_bdf, write_bdf_file, write_bdf_file_with,
    write_bdf_with, write_summary_json,
};

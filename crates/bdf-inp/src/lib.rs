//! NASTRAN bulk data text layer: field codec, card assembly and printing.
//!
//! A deck is read in two steps. [`read_control_decks`] consumes the
//! executive and case control sections verbatim, then [`CardAssembler`]
//! turns the remaining physical lines into logical [`Card`]s. Typed field
//! access goes through the [`Card`] accessors, which decode with the rules
//! in [`field`]. [`print_card`] is the inverse of assembly.

pub mod assembler;
pub mod card;
pub mod error;
pub mod field;
pub mod printer;
pub mod sections;
pub mod source;

pub use assembler::{AssemblerOptions, CardAssembler, CardEvent, END_DATA};
pub use card::{Card, MAX_THRU_SPAN, normalize_name};
pub use error::{CardError, FieldError, InpError};
pub use field::{FieldKind, FieldValue, FieldWidth};
pub use printer::print_card;
pub use sections::{ControlDecks, read_control_decks};
pub use source::{LineSource, ReaderLines, StrLines};

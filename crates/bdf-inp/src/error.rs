//! Error types for the field codec and card assembler.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors raised while decoding or encoding a single field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The field text is not a valid value of the expected kind.
    #[error("cannot read {expected} from field {text:?}")]
    Decode {
        /// Trimmed field text.
        text: String,
        /// Kind the caller asked for.
        expected: FieldKind,
    },

    /// No representation of the value fits in the target width.
    #[error("value {value} does not fit in {width} characters")]
    Overflow {
        /// Value rendered without width constraints.
        value: String,
        /// Target field width.
        width: usize,
    },
}

/// Errors raised by the typed accessors of an assembled card.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CardError {
    /// A field could not be decoded.
    #[error("{card} (line {line}) field {index} '{name}': {source}")]
    Field {
        /// Card name.
        card: String,
        /// First physical line of the card.
        line: usize,
        /// Field index (0 is the card name).
        index: usize,
        /// Field name from the card layout.
        name: String,
        /// Underlying codec error.
        #[source]
        source: FieldError,
    },

    /// The card has the wrong shape or an invalid combination of values.
    #[error("{card} (line {line}): {message}")]
    Validation {
        /// Card name.
        card: String,
        /// First physical line of the card.
        line: usize,
        /// What is wrong.
        message: String,
    },
}

/// Errors raised while reading physical lines into cards.
#[derive(Error, Debug)]
pub enum InpError {
    /// I/O error from the line source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural problem in the deck text.
    #[error("line {line}: {message}")]
    Syntax {
        /// Physical line number (1-based, 0 when unknown).
        line: usize,
        /// What is wrong.
        message: String,
    },
}

impl InpError {
    /// Create a syntax error.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

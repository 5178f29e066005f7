// Configuration block codec
pub mod decoder;
pub mod encoder;
pub mod layout;
pub mod model;
pub mod raw;

use thiserror::Error;

pub use decoder::{parse, Decoded};
pub use encoder::{build, frequency_command};
pub use layout::{FieldSpec, FIELDS};
pub use model::{ConfigModel, FieldId, FieldKind, FieldValue};
pub use raw::{RawRecord, MAGIC, RECORD_SIZE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wrong length or bad magic
    #[error("Malformed record: {0}")]
    Format(String),

    /// A value does not fit its slot
    #[error("Cannot encode {field}: {reason}")]
    Encoding { field: &'static str, reason: String },

    /// The layout does not assemble to exactly one block
    #[error("Layout size invariant violated: {0}")]
    Size(String),

    #[error("{field} holds a {expected} value, got {found}")]
    FieldKind {
        field: &'static str,
        expected: FieldKind,
        found: FieldKind,
    },
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

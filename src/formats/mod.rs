// File format handlers
pub mod record_file;

pub use record_file::{load_record, load_valid_record, save_record, FileError};

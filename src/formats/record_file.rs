// Configuration block files
//
// A file holds the 517-byte block verbatim with no header. Saves go through a
// temporary file in the destination directory which is then renamed over the
// target, so an interrupted save never leaves a truncated file behind.

use crate::record::{CodecError, RawRecord};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] CodecError),
}

pub type Result<T> = std::result::Result<T, FileError>;

/// Read a block file.
///
/// The bytes are returned as read; decoding validates them. Use
/// [`load_valid_record`] to reject malformed files up front.
pub fn load_record(path: impl AsRef<Path>) -> Result<RawRecord> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    tracing::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(RawRecord::new(data))
}

/// Read a block file, failing unless it holds a valid block
pub fn load_valid_record(path: impl AsRef<Path>) -> Result<RawRecord> {
    let record = load_record(path)?;
    record.validate()?;
    Ok(record)
}

/// Write a block file atomically
pub fn save_record(path: impl AsRef<Path>, record: &RawRecord) -> Result<()> {
    let path = path.as_ref();
    record.validate()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(record.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| FileError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    tracing::debug!("Wrote {} bytes to {}", record.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RECORD_SIZE;
    use tempfile::tempdir;

    fn sample_record() -> RawRecord {
        let mut data = RawRecord::blank().into_bytes();
        data[13..20].copy_from_slice(b"KG7KMV\x00");
        RawRecord::new(data)
    }

    #[test]
    fn test_save_load_record() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.sav");

        let record = sample_record();
        save_record(&path, &record)?;

        let loaded = load_valid_record(&path)?;
        assert_eq!(loaded, record);
        assert_eq!(fs::metadata(&path)?.len(), RECORD_SIZE as u64);
        Ok(())
    }

    #[test]
    fn test_save_replaces_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.sav");
        fs::write(&path, b"old contents")?;

        save_record(&path, &sample_record())?;
        assert_eq!(fs::read(&path)?, sample_record().into_bytes());

        // Only the target is left in the directory
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_record_not_saved() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.sav");
        fs::write(&path, b"keep me")?;

        let err = save_record(&path, &RawRecord::new(vec![0u8; 12])).unwrap_err();
        assert!(matches!(err, FileError::Format(CodecError::Format(_))));
        assert_eq!(fs::read(&path)?, b"keep me");
        Ok(())
    }

    #[test]
    fn test_load_raw_bytes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("short.bin");
        fs::write(&path, [1, 2, 3])?;

        assert_eq!(load_record(&path)?.as_bytes(), &[1, 2, 3]);
        assert!(matches!(
            load_valid_record(&path),
            Err(FileError::Format(CodecError::Format(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_record("/nonexistent/settings.sav"),
            Err(FileError::Io(_))
        ));
    }
}

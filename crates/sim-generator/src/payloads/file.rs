//! Payloads read from disk once at construction.

use super::{BuiltPayload, PayloadBuilder};
use crate::preview::{preview_payload, PreviewSource};
use sim_core::{Result, SimError};
use std::fs;
use std::path::{Path, PathBuf};

/// Publishes the cached bytes of a file.
///
/// Pickle files are published as opaque bytes; only their preview differs.
#[derive(Debug, Clone)]
pub struct FilePayloadBuilder {
    payload: Vec<u8>,
    pickle: bool,
}

impl FilePayloadBuilder {
    /// Read `path`, resolving a relative path against `config_dir`.
    pub fn load(path: &str, config_dir: &Path, pickle: bool) -> Result<Self> {
        let kind = if pickle { "pickle_file" } else { "file" };
        if path.is_empty() {
            return Err(SimError::payload(format!(
                "{kind} payload requires a non-empty 'path'"
            )));
        }
        let resolved = resolve_payload_path(path, config_dir);
        let payload = fs::read(&resolved).map_err(|e| {
            SimError::payload(format!(
                "Unable to read payload file: {}: {e}",
                resolved.display()
            ))
        })?;
        Ok(Self { payload, pickle })
    }
}

/// Absolute paths are kept; relative ones are joined onto `config_dir`.
pub fn resolve_payload_path(path: &str, config_dir: &Path) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

impl PayloadBuilder for FilePayloadBuilder {
    fn build(&mut self) -> Result<BuiltPayload> {
        let preview = if self.pickle {
            preview_payload(PreviewSource::Pickle(&self.payload))
        } else {
            preview_payload(PreviewSource::Bytes(&self.payload))
        };
        Ok(BuiltPayload {
            bytes: self.payload.clone(),
            preview,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_relative_path_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("blob.bin")).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        let mut builder = FilePayloadBuilder::load("blob.bin", dir.path(), false).unwrap();
        let built = builder.build().unwrap();
        assert_eq!(built.bytes, vec![1, 2, 3]);
        assert_eq!(built.preview, "<bytes 3B>");
    }

    #[test]
    fn test_absolute_path_and_pickle_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj.pkl");
        fs::write(&path, b"\x80\x04K\x01.").unwrap();

        let other = tempfile::tempdir().unwrap();
        let mut builder =
            FilePayloadBuilder::load(path.to_str().unwrap(), other.path(), true).unwrap();
        assert_eq!(builder.build().unwrap().preview, "<pickle 5B>");
    }

    #[test]
    fn test_file_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, "first").unwrap();

        let mut builder = FilePayloadBuilder::load("data.txt", dir.path(), false).unwrap();
        fs::write(&path, "second").unwrap();
        assert_eq!(builder.build().unwrap().bytes, b"first");
    }

    #[test]
    fn test_missing_file_is_payload_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilePayloadBuilder::load("nope.bin", dir.path(), false).unwrap_err();
        assert!(matches!(err, SimError::PayloadBuild(_)));
        assert!(err.to_string().contains("nope.bin"));
    }
}

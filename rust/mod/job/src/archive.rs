//! Zip output of a batch.
//!
//! Entries are kept sorted by path and written with a fixed timestamp, so
//! the same set of files always yields the same bytes.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use base64::Engine as _;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use erpgen_codegen::GeneratedFile;

use crate::error::JobError;

#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: BTreeMap<String, String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file. A path already present is a defect.
    pub fn add(&mut self, file: GeneratedFile) -> Result<(), JobError> {
        if self.entries.contains_key(&file.path) {
            return Err(JobError::DuplicatePath(file.path));
        }
        self.entries.insert(file.path, file.content);
        Ok(())
    }

    /// Add several files, stopping at the first duplicate.
    pub fn extend(&mut self, files: impl IntoIterator<Item = GeneratedFile>) -> Result<(), JobError> {
        for file in files {
            self.add(file)?;
        }
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Paths in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the zip.
    pub fn finish(&self) -> Result<Vec<u8>, JobError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        for (path, content) in &self.entries {
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

/// Standard base64 of archive bytes.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn builder(files: &[(&str, &str)]) -> ArchiveBuilder {
        let mut b = ArchiveBuilder::new();
        for (path, content) in files {
            b.add(GeneratedFile::new(*path, *content)).unwrap();
        }
        b
    }

    #[test]
    fn entries_are_sorted_and_bytes_stable() {
        let a = builder(&[("b/two.py", "2"), ("a/one.py", "1")]);
        let b = builder(&[("a/one.py", "1"), ("b/two.py", "2")]);
        assert_eq!(a.paths().collect::<Vec<_>>(), vec!["a/one.py", "b/two.py"]);

        let bytes = a.finish().unwrap();
        assert_eq!(bytes, b.finish().unwrap());

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "a/one.py");
        let mut content = String::new();
        zip.by_name("b/two.py").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "2");
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let mut b = builder(&[("x.py", "1")]);
        let err = b.add(GeneratedFile::new("x.py", "2")).unwrap_err();
        assert!(matches!(err, JobError::DuplicatePath(p) if p == "x.py"));
        assert_eq!(b.get("x.py"), Some("1"));
    }

    #[test]
    fn base64_encoding() {
        assert_eq!(encode_base64(b"zip"), "emlw");
    }
}

//! Zip packaging of rendered images.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// What to do when two images resolve to the same entry name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionPolicy {
    /// Append `-2`, `-3`, ... to the base name until it is unique.
    #[default]
    Suffix,
    /// The later image replaces the earlier one, keeping the earlier position.
    Overwrite,
}

/// A finished archive, ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects named entries, then deflates them into a zip.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    policy: CollisionPolicy,
    entries: Vec<(String, Vec<u8>)>,
    positions: HashMap<String, usize>,
}

impl ArchiveBuilder {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `<base_name>.<extension>` and return the name actually used.
    pub fn add(&mut self, base_name: &str, extension: &str, bytes: Vec<u8>) -> String {
        let name = format!("{base_name}.{extension}");

        match (self.positions.get(&name).copied(), self.policy) {
            (None, _) => self.push(name, bytes),
            (Some(position), CollisionPolicy::Overwrite) => {
                self.entries[position].1 = bytes;
                name
            }
            (Some(_), CollisionPolicy::Suffix) => {
                let unique = (2..)
                    .map(|n| format!("{base_name}-{n}.{extension}"))
                    .find(|candidate| !self.positions.contains_key(candidate))
                    .unwrap_or(name);
                self.push(unique, bytes)
            }
        }
    }

    fn push(&mut self, name: String, bytes: Vec<u8>) -> String {
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push((name.clone(), bytes));
        name
    }

    /// Deflate every entry into a zip named `file_name`.
    ///
    /// `on_entry(done, total)` runs after each entry is written; an error
    /// from it abandons the archive.
    pub fn finish<F>(self, file_name: impl Into<String>, mut on_entry: F) -> Result<Archive>
    where
        F: FnMut(usize, usize) -> Result<()>,
    {
        let total = self.entries.len();
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut names = Vec::with_capacity(total);

        for (index, (name, bytes)) in self.entries.into_iter().enumerate() {
            writer.start_file(name.as_str(), options)?;
            writer
                .write_all(&bytes)
                .map_err(|e| Error::ArchiveFailed(format!("failed to write {name}: {e}")))?;
            names.push(name);
            on_entry(index + 1, total)?;
        }

        let bytes = writer.finish()?.into_inner();
        Ok(Archive {
            file_name: file_name.into(),
            bytes,
            entries: names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_entries(archive: &Archive) -> Vec<(String, Vec<u8>)> {
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes.clone())).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).unwrap();
                (file.name().to_string(), bytes)
            })
            .collect()
    }

    #[test]
    fn test_suffixes_repeated_names() {
        let mut builder = ArchiveBuilder::new(CollisionPolicy::Suffix);
        assert_eq!(builder.add("photo", "png", vec![1]), "photo.png");
        assert_eq!(builder.add("photo", "png", vec![2]), "photo-2.png");
        assert_eq!(builder.add("photo", "png", vec![3]), "photo-3.png");
        assert_eq!(builder.add("other", "png", vec![4]), "other.png");
        assert_eq!(builder.len(), 4);
    }

    #[test]
    fn test_suffix_skips_names_already_taken() {
        let mut builder = ArchiveBuilder::new(CollisionPolicy::Suffix);
        builder.add("a-2", "jpeg", vec![]);
        builder.add("a", "jpeg", vec![]);
        assert_eq!(builder.add("a", "jpeg", vec![]), "a-3.jpeg");
    }

    #[test]
    fn test_overwrite_keeps_first_position() {
        let mut builder = ArchiveBuilder::new(CollisionPolicy::Overwrite);
        builder.add("a", "png", vec![1]);
        builder.add("b", "png", vec![2]);
        builder.add("a", "png", vec![3]);

        let archive = builder.finish("out.zip", |_, _| Ok(())).unwrap();
        assert_eq!(archive.entries, vec!["a.png", "b.png"]);
        let entries = read_entries(&archive);
        assert_eq!(entries[0], ("a.png".to_string(), vec![3]));
        assert_eq!(entries[1], ("b.png".to_string(), vec![2]));
    }

    #[test]
    fn test_finish_writes_readable_zip() {
        let mut builder = ArchiveBuilder::default();
        builder.add("x", "webp", b"hello".to_vec());
        builder.add("y", "webp", vec![0; 4096]);

        let mut ticks = Vec::new();
        let archive = builder
            .finish("edited-images-1x1-webp.zip", |done, total| {
                ticks.push((done, total));
                Ok(())
            })
            .unwrap();

        assert_eq!(archive.file_name, "edited-images-1x1-webp.zip");
        assert_eq!(ticks, vec![(1, 2), (2, 2)]);

        let entries = read_entries(&archive);
        assert_eq!(entries[0], ("x.webp".to_string(), b"hello".to_vec()));
        assert_eq!(entries[1].1.len(), 4096);
    }

    #[test]
    fn test_empty_archive_is_valid_zip() {
        let archive = ArchiveBuilder::default()
            .finish("empty.zip", |_, _| Ok(()))
            .unwrap();
        assert!(archive.is_empty());
        assert_eq!(ZipArchive::new(Cursor::new(archive.bytes)).unwrap().len(), 0);
    }

    #[test]
    fn test_callback_error_abandons_archive() {
        let mut builder = ArchiveBuilder::default();
        builder.add("a", "png", vec![1]);
        builder.add("b", "png", vec![2]);
        let err = builder
            .finish("out.zip", |done, _| {
                if done == 1 {
                    Err(Error::Cancelled)
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}

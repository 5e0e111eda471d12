use anyhow::{anyhow, Result};
use polib::catalog::Catalog;
use polib::message::Message;
use polib::metadata::CatalogMetadata;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::{copy_singular, read_catalog, write_catalog};

/// Splits the untranslated entries of a catalog into numbered part files so
/// the work can be distributed or resumed piecemeal.
pub struct PoFileSplitter {
    file_path: PathBuf,
    parts: usize,
    output_folder: PathBuf,
}

impl PoFileSplitter {
    pub fn new(file_path: PathBuf, parts: usize, output_folder: PathBuf) -> Self {
        Self {
            file_path,
            parts,
            output_folder,
        }
    }

    pub fn split(&self) -> Result<Vec<PathBuf>> {
        if self.parts == 0 {
            return Err(anyhow!("number of parts must be at least 1"));
        }
        let source = read_catalog(&self.file_path)?;
        // Entries are carried whole so msgctxt variants of the same msgid
        // stay distinct in the parts.
        let candidates: Vec<Message> = source
            .messages()
            .filter(|message| {
                !message.is_translated() && !message.is_plural() && !message.msgid().is_empty()
            })
            .map(copy_singular)
            .collect();
        if candidates.is_empty() {
            info!(
                "{} has no untranslated entries, nothing to split",
                self.file_path.display()
            );
            return Ok(Vec::new());
        }

        let chunk_size = candidates.len().div_ceil(self.parts);
        let width = self.parts.to_string().len();
        let stem = file_stem(&self.file_path);

        let mut written = Vec::new();
        let mut remaining = candidates.into_iter();
        loop {
            let chunk: Vec<Message> = remaining.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let mut part = Catalog::new(CatalogMetadata::new());
            part.metadata.language = source.metadata.language.clone();
            let count = chunk.len();
            for message in chunk {
                part.append_or_update(message);
            }

            let name = format!(
                "{stem}_part_{:0width$}.po",
                written.len() + 1,
                width = width
            );
            let path = self.output_folder.join(name);
            write_catalog(&part, &path)?;
            info!("wrote {} ({} entries)", path.display(), count);
            written.push(path);
        }
        Ok(written)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("catalog")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::PoFileSplitter;
    use crate::catalog::{read_catalog, singular_message, untranslated_msgids, write_catalog};
    use polib::catalog::Catalog;
    use polib::message::Message;
    use polib::metadata::CatalogMetadata;

    fn sample_catalog(count: usize) -> Catalog {
        let mut catalog = Catalog::new(CatalogMetadata::new());
        for index in 0..count {
            catalog.append_or_update(singular_message(&format!("entry {index}"), ""));
        }
        catalog.append_or_update(singular_message("done", "selesai"));
        catalog
    }

    #[test]
    fn splits_untranslated_entries_across_parts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("module.po");
        write_catalog(&sample_catalog(10), &input).unwrap();

        let splitter = PoFileSplitter::new(input, 3, dir.path().join("parts"));
        let written = splitter.split().unwrap();
        assert_eq!(written.len(), 3);

        let total: usize = written
            .iter()
            .map(|path| untranslated_msgids(&read_catalog(path).unwrap(), usize::MAX).len())
            .sum();
        // Translated entries stay behind.
        assert_eq!(total, 10);
    }

    #[test]
    fn context_variants_stay_distinct_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("module.po");
        let mut catalog = Catalog::new(CatalogMetadata::new());
        for ctxt in ["menu", "file"] {
            catalog.append_or_update(
                Message::build_singular()
                    .with_msgctxt(ctxt.to_string())
                    .with_msgid("Open".to_string())
                    .done(),
            );
        }
        write_catalog(&catalog, &input).unwrap();

        let splitter = PoFileSplitter::new(input, 1, dir.path().to_path_buf());
        let written = splitter.split().unwrap();
        assert_eq!(written.len(), 1);

        let part = read_catalog(&written[0]).unwrap();
        let entries: Vec<(String, String)> = part
            .messages()
            .filter(|message| !message.msgid().is_empty())
            .map(|message| (message.msgctxt().to_string(), message.msgid().to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("menu".to_string(), "Open".to_string()),
                ("file".to_string(), "Open".to_string()),
            ]
        );
    }

    #[test]
    fn part_names_are_zero_padded_to_part_count_width() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("module.po");
        write_catalog(&sample_catalog(12), &input).unwrap();

        let splitter = PoFileSplitter::new(input, 10, dir.path().to_path_buf());
        let written = splitter.split().unwrap();
        let first = written[0].file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(first, "module_part_01.po");
    }

    #[test]
    fn fully_translated_catalog_produces_no_parts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("module.po");
        let mut catalog = Catalog::new(CatalogMetadata::new());
        catalog.append_or_update(singular_message("done", "selesai"));
        write_catalog(&catalog, &input).unwrap();

        let splitter = PoFileSplitter::new(input, 4, dir.path().to_path_buf());
        assert!(splitter.split().unwrap().is_empty());
    }
}

use anyhow::{anyhow, Result};
use polib::catalog::Catalog;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::{copy_singular, read_catalog, write_catalog};

/// Recombines a folder of catalogs (typically splitter output that came back
/// translated) into a single file.
pub struct PoFileMerger {
    folder: PathBuf,
    output: PathBuf,
}

impl PoFileMerger {
    pub fn new(folder: PathBuf, output: PathBuf) -> Self {
        Self { folder, output }
    }

    /// Returns the number of entries in the merged catalog.
    pub fn merge(&self) -> Result<usize> {
        let files = self.collect_po_files();
        if files.is_empty() {
            return Err(anyhow!(
                "no .po files found under {}",
                self.folder.display()
            ));
        }

        // Entries are identified by (msgctxt, msgid) so context variants of
        // the same msgid survive the merge.
        let mut order: Vec<(String, String)> = Vec::new();
        let mut entries: HashMap<(String, String), Message> = HashMap::new();
        let mut language = String::new();

        for file in &files {
            let catalog = match read_catalog(file) {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!("skipping {}: {:#}", file.display(), err);
                    continue;
                }
            };
            if language.is_empty() {
                language = catalog.metadata.language.clone();
            }
            for message in catalog.messages() {
                if message.is_plural() || message.msgid().is_empty() {
                    continue;
                }
                let key = (message.msgctxt().to_string(), message.msgid().to_string());
                // A translated entry wins over an untranslated duplicate.
                let replace = match entries.get(&key) {
                    Some(existing) => !existing.is_translated(),
                    None => {
                        order.push(key.clone());
                        true
                    }
                };
                if replace {
                    entries.insert(key, copy_singular(message));
                }
            }
        }

        let mut merged = Catalog::new(CatalogMetadata::new());
        merged.metadata.language = language;
        for key in &order {
            if let Some(message) = entries.remove(key) {
                merged.append_or_update(message);
            }
        }

        write_catalog(&merged, &self.output)?;
        info!(
            "merged {} files into {} ({} entries)",
            files.len(),
            self.output.display(),
            order.len()
        );
        Ok(order.len())
    }

    fn collect_po_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.folder)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|value| value.to_str()),
                    Some("po")
                )
            })
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::PoFileMerger;
    use crate::catalog::{read_catalog, singular_message, write_catalog};
    use polib::catalog::Catalog;
    use polib::metadata::CatalogMetadata;
    use std::collections::HashMap;

    fn write_parts(dir: &std::path::Path, name: &str, entries: &[(&str, &str)]) {
        let mut catalog = Catalog::new(CatalogMetadata::new());
        for (msgid, msgstr) in entries {
            catalog.append_or_update(singular_message(msgid, msgstr));
        }
        write_catalog(&catalog, &dir.join(name)).unwrap();
    }

    #[test]
    fn merges_nested_folders_and_prefers_translated_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_parts(dir.path(), "part_1.po", &[("halo", "hello"), ("dunia", "")]);
        let nested = dir.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        write_parts(&nested, "part_2.po", &[("dunia", "world")]);

        let output = dir.path().join("merged.po");
        let merger = PoFileMerger::new(dir.path().to_path_buf(), output.clone());
        let count = merger.merge().unwrap();
        assert_eq!(count, 2);

        let merged = read_catalog(&output).unwrap();
        let by_id: HashMap<String, String> = merged
            .messages()
            .map(|message| {
                (
                    message.msgid().to_string(),
                    message.msgstr().unwrap_or("").to_string(),
                )
            })
            .collect();
        assert_eq!(by_id["halo"], "hello");
        assert_eq!(by_id["dunia"], "world");
    }

    #[test]
    fn context_variants_are_kept_apart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = Catalog::new(CatalogMetadata::new());
        for (ctxt, msgstr) in [("menu", "Buka"), ("file", "Membuka")] {
            catalog.append_or_update(
                polib::message::Message::build_singular()
                    .with_msgctxt(ctxt.to_string())
                    .with_msgid("Open".to_string())
                    .with_msgstr(msgstr.to_string())
                    .done(),
            );
        }
        write_catalog(&catalog, &dir.path().join("part_1.po")).unwrap();

        let output = dir.path().join("merged.po");
        let count = PoFileMerger::new(dir.path().to_path_buf(), output.clone())
            .merge()
            .unwrap();
        assert_eq!(count, 2);

        let merged = read_catalog(&output).unwrap();
        let by_ctxt: HashMap<String, String> = merged
            .messages()
            .filter(|message| !message.msgid().is_empty())
            .map(|message| {
                (
                    message.msgctxt().to_string(),
                    message.msgstr().unwrap_or("").to_string(),
                )
            })
            .collect();
        assert_eq!(by_ctxt["menu"], "Buka");
        assert_eq!(by_ctxt["file"], "Membuka");
    }

    #[test]
    fn empty_folder_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let merger = PoFileMerger::new(dir.path().to_path_buf(), dir.path().join("merged.po"));
        assert!(merger.merge().is_err());
    }
}

use anyhow::{anyhow, Context, Result};
use polib::catalog::Catalog;
use polib::message::{Message, MessageMutView, MessageView};
use polib::po_file;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Signature written into the metadata of generated catalogs.
pub const TEAM_SIGNATURE: &str = "po-translator";

/// The parser panics on header blocks missing expected keys (a minimal
/// header with only `Content-Type` is valid gettext input), so the panic is
/// contained here and surfaced as an ordinary error.
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let parsed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| po_file::parse(path)))
        .map_err(|_| anyhow!("incomplete metadata header in PO file: {}", path.display()))?;
    parsed.with_context(|| format!("failed to parse PO file: {}", path.display()))
}

pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    }
    po_file::write(catalog, path)
        .with_context(|| format!("failed to write PO file: {}", path.display()))
}

/// Texts needing translation: msgids of untranslated singular entries, no
/// longer than `max_msgid_length` characters. msgctxt variants of the same
/// msgid share one request, so duplicates are dropped.
pub fn untranslated_msgids(catalog: &Catalog, max_msgid_length: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    catalog
        .messages()
        .filter(|message| !message.is_translated() && !message.is_plural())
        .map(|message| message.msgid().to_string())
        .filter(|msgid| !msgid.is_empty() && msgid.chars().count() <= max_msgid_length)
        .filter(|msgid| seen.insert(msgid.clone()))
        .collect()
}

/// Rebuild a singular entry as an owned `Message`, keeping its context,
/// comments, source locations and flags.
pub fn copy_singular(message: &dyn MessageView) -> Message {
    let mut builder = Message::build_singular();
    builder
        .with_msgid(message.msgid().to_string())
        .with_msgstr(message.msgstr().unwrap_or("").to_string())
        .with_flags(message.flags().clone());
    if !message.msgctxt().is_empty() {
        builder.with_msgctxt(message.msgctxt().to_string());
    }
    if !message.comments().is_empty() {
        builder.with_comments(message.comments().to_string());
    }
    if !message.source().is_empty() {
        builder.with_source(message.source().to_string());
    }
    builder.done()
}

/// Write translations back into the catalog, matching by msgid identity.
/// Returns the number of entries updated.
pub fn apply_translations(catalog: &mut Catalog, translations: &HashMap<String, String>) -> usize {
    let mut applied = 0;
    for mut message in catalog.messages_mut() {
        if message.is_plural() {
            continue;
        }
        let msgid = message.msgid().to_string();
        let Some(translated) = translations.get(&msgid) else {
            continue;
        };
        if message.set_msgstr(translated.clone()).is_ok() {
            applied += 1;
        }
    }
    applied
}

pub fn stamp_metadata(catalog: &mut Catalog, target_lang: &str) {
    catalog.metadata.last_translator = TEAM_SIGNATURE.to_string();
    catalog.metadata.language_team = TEAM_SIGNATURE.to_string();
    catalog.metadata.language = target_lang.to_string();
}

pub fn singular_message(msgid: &str, msgstr: &str) -> Message {
    Message::build_singular()
        .with_msgid(msgid.to_string())
        .with_msgstr(msgstr.to_string())
        .done()
}

/// Compute where the translated catalog is written. The Odoo layout nests the
/// file as `<output>/<stem>/i18n/<target>.po`; the flat layout appends the
/// target language to the stem.
pub fn output_path(output_folder: &Path, input: &Path, target_lang: &str, odoo: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("catalog");
    if odoo {
        output_folder
            .join(stem)
            .join("i18n")
            .join(format!("{target_lang}.po"))
    } else {
        output_folder.join(format!("{stem}_{target_lang}.po"))
    }
}

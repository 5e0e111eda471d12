use polib::catalog::Catalog;
use polib::metadata::CatalogMetadata;
use std::collections::HashMap;

use po_translator::catalog::{
    apply_translations, read_catalog, singular_message, untranslated_msgids, write_catalog,
};
use po_translator::{PoFileMerger, PoFileSplitter};

#[test]
fn split_translate_merge_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("module.po");

    let mut catalog = Catalog::new(CatalogMetadata::new());
    for index in 0..7 {
        catalog.append_or_update(singular_message(&format!("kata {index}"), ""));
    }
    write_catalog(&catalog, &input).unwrap();

    let parts_dir = dir.path().join("parts");
    let parts = PoFileSplitter::new(input, 3, parts_dir.clone())
        .split()
        .unwrap();
    assert_eq!(parts.len(), 3);

    let split_total: usize = parts
        .iter()
        .map(|path| untranslated_msgids(&read_catalog(path).unwrap(), usize::MAX).len())
        .sum();
    assert_eq!(split_total, 7);

    // Simulate the parts coming back translated.
    for path in &parts {
        let mut part = read_catalog(path).unwrap();
        let translations: HashMap<String, String> = untranslated_msgids(&part, usize::MAX)
            .into_iter()
            .map(|msgid| {
                let translated = format!("word {}", &msgid["kata ".len()..]);
                (msgid, translated)
            })
            .collect();
        apply_translations(&mut part, &translations);
        write_catalog(&part, path).unwrap();
    }

    let merged_path = dir.path().join("merged.po");
    let count = PoFileMerger::new(parts_dir, merged_path.clone())
        .merge()
        .unwrap();
    assert_eq!(count, 7);

    let merged = read_catalog(&merged_path).unwrap();
    for index in 0..7 {
        let msgid = format!("kata {index}");
        let message = merged
            .messages()
            .find(|message| message.msgid() == msgid)
            .expect("merged catalog keeps every split entry");
        assert_eq!(message.msgstr().unwrap(), format!("word {index}"));
    }
}

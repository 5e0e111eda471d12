use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Rotation threshold for a single cache segment file.
pub const MAX_SEGMENT_BYTES: u64 = 1024 * 1024;

/// On-disk translation cache, stored as rotating JSON segments
/// (`cache_0.json`, `cache_1.json`, ...). Entries are append-only; once the
/// active segment file reaches the size threshold a new segment is started.
/// Lookups consult every segment loaded at open time.
pub struct TranslationCache {
    dir: PathBuf,
    max_segment_bytes: u64,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    /// Union of every segment, for lookups.
    entries: HashMap<String, String>,
    /// Contents of the active segment only, rewritten on each insert.
    active: HashMap<String, String>,
    active_index: u64,
}

impl TranslationCache {
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_limit(dir, MAX_SEGMENT_BYTES)
    }

    pub fn open_with_limit(dir: &Path, max_segment_bytes: u64) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory: {}", dir.display()))?;

        let mut indices = segment_indices(dir)?;
        indices.sort_unstable();

        let mut entries = HashMap::new();
        let mut active = HashMap::new();
        let mut active_index = 0;
        for index in &indices {
            let segment = read_segment(&segment_path(dir, *index))?;
            entries.extend(segment);
        }
        if let Some(last) = indices.last() {
            let path = segment_path(dir, *last);
            let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            if size >= max_segment_bytes {
                active_index = last + 1;
            } else {
                active_index = *last;
                active = read_segment(&path)?;
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            max_segment_bytes,
            inner: Mutex::new(CacheInner {
                entries,
                active,
                active_index,
            }),
        })
    }

    pub fn get(
        &self,
        source_lang: &str,
        target_lang: &str,
        translator: &str,
        source_text: &str,
    ) -> Option<String> {
        let key = cache_key(source_lang, target_lang, translator, source_text);
        let inner = self.inner.lock().ok()?;
        inner.entries.get(&key).cloned()
    }

    pub fn put(
        &self,
        source_lang: &str,
        target_lang: &str,
        translator: &str,
        source_text: &str,
        translated_text: &str,
    ) -> Result<()> {
        let key = cache_key(source_lang, target_lang, translator, source_text);
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow!("translation cache lock poisoned"))?;
        inner
            .entries
            .insert(key.clone(), translated_text.to_string());
        inner.active.insert(key, translated_text.to_string());

        let path = segment_path(&self.dir, inner.active_index);
        let content = serde_json::to_string_pretty(&inner.active)?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write cache segment: {}", path.display()))?;

        let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        if size >= self.max_segment_bytes {
            inner.active_index += 1;
            inner.active.clear();
            debug!("rotating translation cache to segment {}", inner.active_index);
        }
        Ok(())
    }
}

fn cache_key(source_lang: &str, target_lang: &str, translator: &str, source_text: &str) -> String {
    let key = format!("{source_lang}:{target_lang}:{translator}:{source_text}");
    format!("{:x}", md5::compute(key.as_bytes()))
}

fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("cache_{index}.json"))
}

fn segment_indices(dir: &Path) -> Result<Vec<u64>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list cache directory: {}", dir.display()))?;
    let mut indices = Vec::new();
    for entry in entries {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(index) = name
            .strip_prefix("cache_")
            .and_then(|rest| rest.strip_suffix(".json"))
            .and_then(|rest| rest.parse::<u64>().ok())
        {
            indices.push(index);
        }
    }
    Ok(indices)
}

fn read_segment(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read cache segment: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse cache segment: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{TranslationCache, MAX_SEGMENT_BYTES};

    #[test]
    fn stores_and_recalls_translations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TranslationCache::open(dir.path()).unwrap();

        cache.put("id", "en", "GoogleTranslator", "halo", "hello").unwrap();
        assert_eq!(
            cache.get("id", "en", "GoogleTranslator", "halo"),
            Some("hello".to_string())
        );
        // Key covers the whole translation request, not just the text.
        assert_eq!(cache.get("id", "fr", "GoogleTranslator", "halo"), None);
        assert_eq!(cache.get("id", "en", "DeeplTranslator", "halo"), None);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let cache = TranslationCache::open(dir.path()).unwrap();
            cache.put("id", "en", "GoogleTranslator", "dunia", "world").unwrap();
        }
        let cache = TranslationCache::open(dir.path()).unwrap();
        assert_eq!(
            cache.get("id", "en", "GoogleTranslator", "dunia"),
            Some("world".to_string())
        );
    }

    #[test]
    fn rotates_to_new_segment_at_threshold() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TranslationCache::open_with_limit(dir.path(), 64).unwrap();

        for index in 0..8 {
            let text = format!("source text number {index}");
            cache
                .put("id", "en", "GoogleTranslator", &text, "translated")
                .unwrap();
        }

        let segments = std::fs::read_dir(dir.path()).unwrap().count();
        assert!(segments > 1, "expected rotation to create extra segments");

        // Entries written before a rotation are still found afterwards.
        assert_eq!(
            cache.get("id", "en", "GoogleTranslator", "source text number 0"),
            Some("translated".to_string())
        );

        // Older segments stay visible across a reopen as well.
        let reopened = TranslationCache::open_with_limit(dir.path(), 64).unwrap();
        assert_eq!(
            reopened.get("id", "en", "GoogleTranslator", "source text number 0"),
            Some("translated".to_string())
        );
    }

    #[test]
    fn default_limit_is_one_mebibyte() {
        assert_eq!(MAX_SEGMENT_BYTES, 1024 * 1024);
    }
}

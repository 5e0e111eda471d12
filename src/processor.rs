use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TranslationCache;
use crate::catalog;
use crate::config::Config;
use crate::placeholders;
use crate::providers::{build_service, ServiceImpl, TranslationService};

/// Translates one catalog end to end: read, fan the untranslated entries out
/// over worker tasks, write the result.
pub struct PoFileProcessor {
    file_path: PathBuf,
    config: Config,
    output_folder: PathBuf,
    odoo_output: bool,
    jobs: usize,
    force: bool,
    cache: Option<Arc<TranslationCache>>,
}

impl PoFileProcessor {
    pub fn new(
        file_path: PathBuf,
        config: Config,
        output_folder: PathBuf,
        odoo_output: bool,
        jobs: usize,
        force: bool,
        cache: Option<Arc<TranslationCache>>,
    ) -> Self {
        Self {
            file_path,
            config,
            output_folder,
            odoo_output,
            jobs,
            force,
            cache,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        catalog::output_path(
            &self.output_folder,
            &self.file_path,
            &self.config.target_lang,
            self.odoo_output,
        )
    }

    pub async fn process(&self) -> Result<()> {
        let output = self.output_path();
        if output.exists() && !self.force {
            info!(
                "skipping {} (output exists, use --force to overwrite)",
                self.file_path.display()
            );
            return Ok(());
        }

        // Unreadable catalogs are skipped, not fatal.
        let mut catalog = match catalog::read_catalog(&self.file_path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("skipping {}: {:#}", self.file_path.display(), err);
                return Ok(());
            }
        };

        let msgids = catalog::untranslated_msgids(&catalog, self.config.max_msgid_length);
        info!(
            "{}: {} of {} entries need translation",
            self.file_path.display(),
            msgids.len(),
            catalog.count()
        );

        let translations = if msgids.is_empty() {
            HashMap::new()
        } else {
            self.translate_all(msgids).await?
        };

        let applied = catalog::apply_translations(&mut catalog, &translations);
        catalog::stamp_metadata(&mut catalog, &self.config.target_lang);
        catalog::write_catalog(&catalog, &output)?;
        info!("wrote {} ({} entries translated)", output.display(), applied);
        Ok(())
    }

    /// Splits the msgids into one chunk per worker and runs the chunks as
    /// concurrent tasks. The first worker failure aborts the whole file.
    async fn translate_all(&self, msgids: Vec<String>) -> Result<HashMap<String, String>> {
        let service = build_service(&self.config)?;
        let jobs = self.jobs.max(1);
        let chunk_size = (msgids.len() / jobs).max(1);

        let progress = ProgressBar::new(msgids.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let failed = Arc::new(AtomicBool::new(false));

        let mut handles: Vec<JoinHandle<Result<HashMap<String, String>>>> = Vec::new();
        for chunk in msgids.chunks(chunk_size) {
            let worker = ChunkWorker {
                service: service.clone(),
                config: self.config.clone(),
                cache: self.cache.clone(),
                progress: progress.clone(),
                failed: failed.clone(),
            };
            let chunk = chunk.to_vec();
            handles.push(tokio::spawn(async move { worker.run(chunk).await }));
        }

        let mut translations = HashMap::new();
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(chunk)) => translations.extend(chunk),
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(anyhow!("translation worker panicked: {err}"));
                    }
                }
            }
        }
        progress.finish_and_clear();

        match first_error {
            Some(err) => Err(err),
            None => Ok(translations),
        }
    }
}

struct ChunkWorker {
    service: ServiceImpl,
    config: Config,
    cache: Option<Arc<TranslationCache>>,
    progress: ProgressBar,
    failed: Arc<AtomicBool>,
}

impl ChunkWorker {
    async fn run(&self, msgids: Vec<String>) -> Result<HashMap<String, String>> {
        let mut translations = HashMap::new();
        for msgid in msgids {
            if self.failed.load(Ordering::SeqCst) {
                break;
            }
            match self.translate_one(&msgid).await {
                Ok(translated) => {
                    translations.insert(msgid, translated);
                    self.progress.inc(1);
                }
                Err(err) => {
                    self.failed.store(true, Ordering::SeqCst);
                    return Err(err.context(format!("failed to translate '{msgid}'")));
                }
            }
        }
        Ok(translations)
    }

    /// Placeholders are masked before the text leaves the process and
    /// restored in the response. The cache stores the masked form so hits are
    /// placeholder-safe.
    async fn translate_one(&self, msgid: &str) -> Result<String> {
        let (masked, mapping) = placeholders::mask(msgid);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(
                &self.config.source_lang,
                &self.config.target_lang,
                &self.config.translator,
                &masked,
            ) {
                debug!("cache hit for '{msgid}'");
                return Ok(placeholders::restore(&hit, &mapping));
            }
        }

        let translated = self.service.translate(&masked).await?;
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(
                &self.config.source_lang,
                &self.config.target_lang,
                &self.config.translator,
                &masked,
                &translated,
            ) {
                warn!("failed to update translation cache: {:#}", err);
            }
        }
        Ok(placeholders::restore(&translated, &mapping))
    }
}

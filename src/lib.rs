use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

pub mod cache;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod merger;
mod paths;
pub mod placeholders;
pub mod processor;
pub mod providers;
pub mod splitter;
#[cfg(test)]
mod test_util;

pub use cache::TranslationCache;
pub use config::Config;
pub use merger::PoFileMerger;
pub use processor::PoFileProcessor;
pub use splitter::PoFileSplitter;

#[derive(Debug, Clone)]
pub struct TranslateRequest {
    pub file_path: Option<PathBuf>,
    pub folder_path: Option<PathBuf>,
    pub output_folder: PathBuf,
    pub config_path: Option<PathBuf>,
    pub jobs: usize,
    pub force: bool,
    pub no_cache: bool,
    pub odoo_output: bool,
}

pub async fn run_translate(request: TranslateRequest) -> Result<()> {
    let config = Config::load(request.config_path.as_deref())?;
    let cache = if request.no_cache {
        None
    } else {
        Some(Arc::new(TranslationCache::open(&paths::cache_dir())?))
    };

    if let Some(file) = &request.file_path {
        info!("single file mode, processing {}", file.display());
        return processor_for(file, &request, &config, cache).process().await;
    }

    let Some(folder) = &request.folder_path else {
        return Err(anyhow!("either --file or --folder must be provided"));
    };

    info!("folder mode, processing files in {}", folder.display());
    let files = list_po_files(folder)?;
    if files.is_empty() {
        info!("no .po or .pot files found in {}", folder.display());
        return Ok(());
    }

    for file in files {
        let processor = processor_for(&file, &request, &config, cache.clone());
        if let Err(err) = processor.process().await {
            // First translation failure stops the folder run.
            error!("stopping folder processing: {:#}", err);
            return Err(err);
        }
    }
    Ok(())
}

fn processor_for(
    file: &Path,
    request: &TranslateRequest,
    config: &Config,
    cache: Option<Arc<TranslationCache>>,
) -> PoFileProcessor {
    PoFileProcessor::new(
        file.to_path_buf(),
        config.clone(),
        request.output_folder.clone(),
        request.odoo_output,
        request.jobs,
        request.force,
        cache,
    )
}

fn list_po_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("failed to read folder: {}", folder.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let ext = path.extension().and_then(|value| value.to_str());
        if matches!(ext, Some("po") | Some("pot")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

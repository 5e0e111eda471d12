use anyhow::{anyhow, Result};
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;

mod deepl;
mod google;
mod libre;
mod mymemory;
mod retry;

pub use deepl::Deepl;
pub use google::Google;
pub use libre::Libre;
pub use mymemory::MyMemory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Google,
    Deepl,
    Libre,
    MyMemory,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Google,
        ServiceKind::Deepl,
        ServiceKind::Libre,
        ServiceKind::MyMemory,
    ];

    /// Service name as it appears in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Google => "GoogleTranslator",
            ServiceKind::Deepl => "DeeplTranslator",
            ServiceKind::Libre => "LibreTranslator",
            ServiceKind::MyMemory => "MyMemoryTranslator",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name.trim())
    }
}

pub type TranslateFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

pub trait TranslationService: Clone + Send + Sync {
    fn translate(&self, text: &str) -> TranslateFuture;
}

#[derive(Debug, Clone)]
pub enum ServiceImpl {
    Google(Google),
    Deepl(Deepl),
    Libre(Libre),
    MyMemory(MyMemory),
}

impl TranslationService for ServiceImpl {
    fn translate(&self, text: &str) -> TranslateFuture {
        match self {
            ServiceImpl::Google(service) => service.translate(text),
            ServiceImpl::Deepl(service) => service.translate(text),
            ServiceImpl::Libre(service) => service.translate(text),
            ServiceImpl::MyMemory(service) => service.translate(text),
        }
    }
}

/// Name-to-backend factory wiring the configured credentials plus the global
/// language pair.
pub fn build_service(config: &Config) -> Result<ServiceImpl> {
    let kind = ServiceKind::from_name(&config.translator).ok_or_else(|| {
        anyhow!(
            "unknown translator '{}' (supported: {})",
            config.translator,
            supported_names().join(", ")
        )
    })?;
    let source = config.source_lang.clone();
    let target = config.target_lang.clone();

    Ok(match kind {
        ServiceKind::Google => ServiceImpl::Google(Google::new(source, target)),
        ServiceKind::Deepl => ServiceImpl::Deepl(Deepl::new(source, target, &config.deepl)?),
        ServiceKind::Libre => ServiceImpl::Libre(Libre::new(source, target, &config.libre)),
        ServiceKind::MyMemory => {
            ServiceImpl::MyMemory(MyMemory::new(source, target, &config.mymemory))
        }
    })
}

fn supported_names() -> Vec<&'static str> {
    ServiceKind::ALL.iter().map(ServiceKind::as_str).collect()
}

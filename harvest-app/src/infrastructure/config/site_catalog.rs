use crate::domain::{BrowserOptions, SiteConfig};
use harvest_errors::CrawlError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../../config/sites.toml");

/// Every crawlable site plus the browser settings shared by all of them.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteCatalog {
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(rename = "site", default)]
    sites: Vec<SiteConfig>,
}

impl SiteCatalog {
    pub fn builtin() -> Result<Self, CrawlError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CrawlError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source).map_err(|e| match e {
            CrawlError::Config(msg) => CrawlError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CrawlError> {
        let catalog: Self =
            toml::from_str(source).map_err(|e| CrawlError::Config(e.to_string().trim().to_string()))?;

        let mut names = HashSet::new();
        for site in &catalog.sites {
            site.validate()?;
            if !names.insert(site.name.to_lowercase()) {
                return Err(CrawlError::Config(format!(
                    "site `{}` is defined more than once",
                    site.name
                )));
            }
        }

        tracing::debug!("Loaded {} site definitions", catalog.sites.len());
        Ok(catalog)
    }

    /// Looks a site up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&SiteConfig> {
        self.sites
            .iter()
            .find(|site| site.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn names(&self) -> Vec<&str> {
        self.sites.iter().map(|site| site.name.as_str()).collect()
    }

    pub fn override_target(&mut self, target_count: usize) {
        for site in &mut self.sites {
            site.target_count = target_count;
        }
    }
}

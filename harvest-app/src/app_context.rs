use crate::domain::{BrowserOptions, SiteConfig};
use crate::infrastructure::config::SiteCatalog;
use crate::infrastructure::sink::{CsvSink, JsonLinesSink, ReviewSink};
use std::path::Path;

#[cfg(feature = "headless")]
use crate::application::HarvestSite;
#[cfg(feature = "headless")]
use crate::infrastructure::browser::ChromeLauncher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    JsonLines,
}

/// Everything a harvest run needs, built once at startup and handed down.
pub struct HarvestContext {
    catalog: SiteCatalog,
    browser: BrowserOptions,
    sink: Box<dyn ReviewSink>,
}

impl HarvestContext {
    pub fn new(catalog: SiteCatalog, output_dir: &Path, format: OutputFormat) -> Self {
        let sink: Box<dyn ReviewSink> = match format {
            OutputFormat::Csv => Box::new(CsvSink::new(output_dir)),
            OutputFormat::JsonLines => Box::new(JsonLinesSink::new(output_dir)),
        };
        let browser = catalog.browser.clone();
        Self {
            catalog,
            browser,
            sink,
        }
    }

    /// Like [`HarvestContext::new`], but `VISIBLE_BROWSER` turns headless off.
    pub fn from_env(catalog: SiteCatalog, output_dir: &Path, format: OutputFormat) -> Self {
        let visible = visible_requested(std::env::var("VISIBLE_BROWSER").ok().as_deref());
        Self::new(catalog, output_dir, format).with_visible(visible)
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        if visible {
            self.browser.headless = false;
        }
        self
    }

    pub fn catalog(&self) -> &SiteCatalog {
        &self.catalog
    }

    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.catalog.get(name)
    }

    pub fn browser(&self) -> &BrowserOptions {
        &self.browser
    }

    pub fn sink(&self) -> &dyn ReviewSink {
        self.sink.as_ref()
    }

    #[cfg(feature = "headless")]
    pub fn harvester(&self) -> HarvestSite<ChromeLauncher> {
        HarvestSite::new(ChromeLauncher::new(self.browser.clone()))
    }
}

fn visible_requested(value: Option<&str>) -> bool {
    match value {
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReviewRecord;

    #[test]
    fn test_visible_requested() {
        assert!(!visible_requested(None));
        assert!(!visible_requested(Some("0")));
        assert!(!visible_requested(Some("false")));
        assert!(visible_requested(Some("1")));
        assert!(visible_requested(Some("true")));
    }

    #[test]
    fn test_with_visible_overrides_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let context = HarvestContext::new(
            SiteCatalog::builtin().unwrap(),
            dir.path(),
            OutputFormat::Csv,
        );
        assert!(context.browser().headless);

        let context = context.with_visible(true);
        assert!(!context.browser().headless);
        assert!(context.site("klook").is_some());
    }

    #[test]
    fn test_sink_follows_format() {
        let dir = tempfile::tempdir().unwrap();
        let context = HarvestContext::new(
            SiteCatalog::from_toml_str("").unwrap(),
            dir.path(),
            OutputFormat::JsonLines,
        );

        let path = context
            .sink()
            .store("klook", &[ReviewRecord::new("good")])
            .unwrap();

        assert_eq!(path, dir.path().join("reviews_klook.jsonl"));
    }
}

use super::DedupStrategy;
use harvest_errors::CrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_TARGET_COUNT: usize = 500;
const DEFAULT_MAX_STEPS: usize = 300;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-default-apps",
    "--disable-popup-blocking",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
    "--mute-audio",
    "--no-pings",
];

/// Where to find an element. Most sites need only CSS; XPath covers
/// text matches such as the "최신순" sort option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css:{}", selector),
            Self::XPath(expr) => write!(f, "xpath:{}", expr),
        }
    }
}

/// One browser interaction meant to reveal more review content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdvanceAction {
    ScrollToBottom,
    Click {
        locator: Locator,
        /// Class marking the control as inert, e.g. a greyed-out "next".
        #[serde(default)]
        disabled_class: Option<String>,
    },
    /// Clicks through `element.click()` in page script, which ignores
    /// overlays and visibility checks.
    ClickViaScript {
        locator: Locator,
        #[serde(default)]
        disabled_class: Option<String>,
    },
    SelectFilter {
        selector: String,
        index: usize,
    },
}

impl fmt::Display for AdvanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScrollToBottom => f.write_str("scroll_to_bottom"),
            Self::Click { locator, .. } => write!(f, "click({})", locator),
            Self::ClickViaScript { locator, .. } => write!(f, "click_via_script({})", locator),
            Self::SelectFilter { selector, index } => {
                write!(f, "select_filter({}[{}])", selector, index)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTake {
    #[default]
    All,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldLocatorRepr")]
pub struct FieldLocator {
    pub selector: String,
    pub take: TextTake,
}

impl FieldLocator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            take: TextTake::All,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldLocatorRepr {
    Selector(String),
    Detailed {
        selector: String,
        #[serde(default)]
        take: TextTake,
    },
}

impl From<FieldLocatorRepr> for FieldLocator {
    fn from(repr: FieldLocatorRepr) -> Self {
        match repr {
            FieldLocatorRepr::Selector(selector) => Self::css(selector),
            FieldLocatorRepr::Detailed { selector, take } => Self { selector, take },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RatingLocator {
    /// Rating is the number of matching sub-elements, e.g. lit star icons.
    Count { selector: String },
    Text { selector: String },
}

/// Reformats dates such as `작성일: 2024년 3월 5일` into `2024.03.05`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRewrite {
    #[serde(default)]
    pub strip_prefix: Option<String>,
    pub input_format: String,
    pub output_format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub container: String,
    #[serde(default)]
    pub rating: Option<RatingLocator>,
    #[serde(default)]
    pub date: Option<FieldLocator>,
    pub content: FieldLocator,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub date_rewrite: Option<DateRewrite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleTimings {
    pub initial_ms: u64,
    pub after_advance_ms: u64,
    pub change_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub element_timeout_ms: u64,
}

impl Default for SettleTimings {
    fn default() -> Self {
        Self {
            initial_ms: 3000,
            after_advance_ms: 1500,
            change_timeout_ms: 10_000,
            poll_interval_ms: 250,
            element_timeout_ms: 10_000,
        }
    }
}

impl SettleTimings {
    /// All waits disabled; used for replaying recorded pages.
    pub fn immediate() -> Self {
        Self {
            initial_ms: 0,
            after_advance_ms: 0,
            change_timeout_ms: 0,
            poll_interval_ms: 0,
            element_timeout_ms: 0,
        }
    }

    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn after_advance(&self) -> Duration {
        Duration::from_millis(self.after_advance_ms)
    }

    pub fn change_timeout(&self) -> Duration {
        Duration::from_millis(self.change_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
    pub args: Vec<String>,
    pub window_size: (u32, u32),
    pub lang: String,
    pub idle_timeout_secs: u64,
    /// Inject the navigator-masking script on every new document.
    pub stealth: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            args: DEFAULT_BROWSER_ARGS.iter().map(|a| a.to_string()).collect(),
            window_size: (1920, 1080),
            lang: "ko-KR".to_string(),
            idle_timeout_secs: 120,
            stealth: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default)]
    pub dedup: DedupStrategy,
    pub selectors: SelectorConfig,
    /// Run once before collecting, e.g. switching to newest-first.
    #[serde(default)]
    pub setup: Vec<AdvanceAction>,
    /// Selector matching every filter/category control. Each match becomes
    /// one outer pass of the collector.
    #[serde(default)]
    pub filters: Option<String>,
    #[serde(default)]
    pub pagination: Option<AdvanceAction>,
    #[serde(default)]
    pub settle: SettleTimings,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
}

fn default_target_count() -> usize {
    DEFAULT_TARGET_COUNT
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl SiteConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.name.trim().is_empty() {
            return Err(CrawlError::Config("site name must not be empty".to_string()));
        }

        let parsed = url::Url::parse(&self.url)
            .map_err(|e| CrawlError::Config(format!("{}: invalid url: {}", self.name, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::Config(format!(
                "{}: only http and https urls are crawled",
                self.name
            )));
        }

        if self.target_count == 0 {
            return Err(CrawlError::Config(format!(
                "{}: target_count must be positive",
                self.name
            )));
        }

        if self.max_steps == 0 {
            return Err(CrawlError::Config(format!(
                "{}: max_steps must be positive",
                self.name
            )));
        }

        if let Some(AdvanceAction::SelectFilter { .. }) = self.pagination {
            return Err(CrawlError::Config(format!(
                "{}: select_filter cannot be used for pagination, use `filters`",
                self.name
            )));
        }

        Ok(())
    }
}

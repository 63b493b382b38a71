use super::stealth::{
    click_script, css_lookup, nth_lookup, xpath_lookup, SCROLL_TO_BOTTOM_JS, STEALTH_JS,
};
use super::{AdvanceOutcome, BrowserSession, SessionLauncher};
use crate::domain::{AdvanceAction, BrowserOptions, Locator, SettleTimings};
use harvest_errors::CrawlError;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Launches one Chrome process per crawl.
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn launch(&self) -> Result<Browser, CrawlError> {
        let lang_arg = format!("--lang={}", self.options.lang);
        let mut args: Vec<&OsStr> = self.options.args.iter().map(OsStr::new).collect();
        args.push(OsStr::new(&lang_arg));

        let launch_options = LaunchOptions::default_builder()
            .headless(self.options.headless)
            .sandbox(false)
            .window_size(Some(self.options.window_size))
            .idle_browser_timeout(Duration::from_secs(self.options.idle_timeout_secs))
            .args(args)
            .build()
            .map_err(|e| CrawlError::BrowserLaunch(e.to_string()))?;

        if !self.options.headless {
            tracing::info!("Using visible browser mode");
        }

        Browser::new(launch_options).map_err(|e| CrawlError::BrowserLaunch(e.to_string()))
    }

    fn prepare_tab(&self, tab: &Arc<Tab>) -> Result<(), CrawlError> {
        tab.set_user_agent(&self.options.user_agent, Some(&self.options.lang), None)
            .map_err(|e| CrawlError::BrowserLaunch(e.to_string()))?;

        if self.options.stealth {
            let add_script = Page::AddScriptToEvaluateOnNewDocument {
                source: STEALTH_JS.to_string(),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            };
            if let Err(e) = tab.call_method(add_script) {
                tracing::warn!("Could not install stealth script: {}", e);
            }
        }

        Ok(())
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn open(&self, url: &str, settle: &SettleTimings) -> Result<ChromeSession, CrawlError> {
        tracing::info!("Launching browser for {}", url);

        let browser = self.launch()?;
        let tab = browser
            .new_tab()
            .map_err(|e| CrawlError::BrowserLaunch(e.to_string()))?;
        self.prepare_tab(&tab)?;

        // From here on the session owns the process, so an early return
        // still tears it down through Drop.
        let mut session = ChromeSession {
            browser: Some(browser),
            tab,
            settle: *settle,
            url: url.to_string(),
        };
        session.navigate()?;
        Ok(session)
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    settle: SettleTimings,
    url: String,
}

impl ChromeSession {
    fn navigate(&mut self) -> Result<(), CrawlError> {
        self.tab
            .navigate_to(&self.url)
            .map_err(|e| CrawlError::Navigation(format!("{}: {}", self.url, e)))?;

        if self.tab.wait_until_navigated().is_err() {
            tracing::warn!("Navigation timeout for {}", self.url);
        }

        std::thread::sleep(self.settle.initial());
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.browser
            .as_ref()
            .is_some_and(|browser| browser.get_version().is_ok())
    }

    fn scroll_to_bottom(&self) -> Result<AdvanceOutcome, CrawlError> {
        self.tab
            .evaluate(SCROLL_TO_BOTTOM_JS, false)
            .map_err(|e| CrawlError::ActionFailed(format!("scroll: {}", e)))?;
        Ok(AdvanceOutcome::Advanced)
    }

    fn click(
        &self,
        locator: &Locator,
        disabled_class: Option<&str>,
    ) -> Result<AdvanceOutcome, CrawlError> {
        let timeout = self.settle.element_timeout();
        let element = match locator {
            Locator::Css(selector) => self.tab.wait_for_element_with_custom_timeout(selector, timeout),
            Locator::XPath(expr) => self.tab.wait_for_xpath_with_custom_timeout(expr, timeout),
        }
        .map_err(|_| CrawlError::ElementNotFound(locator.to_string()))?;

        if let Some(class) = disabled_class {
            let classes = element
                .get_attribute_value("class")
                .map_err(|e| CrawlError::ActionFailed(e.to_string()))?
                .unwrap_or_default();
            if classes.split_whitespace().any(|c| c == class) {
                return Ok(AdvanceOutcome::Exhausted);
            }
        }

        if let Err(e) = element.scroll_into_view() {
            tracing::debug!("scroll_into_view failed for {}: {}", locator, e);
        }
        element
            .click()
            .map_err(|e| CrawlError::ActionFailed(format!("click {}: {}", locator, e)))?;
        Ok(AdvanceOutcome::Advanced)
    }

    fn click_via_script(
        &self,
        locator: &Locator,
        disabled_class: Option<&str>,
    ) -> Result<AdvanceOutcome, CrawlError> {
        let lookup = match locator {
            Locator::Css(selector) => {
                // Explicit wait first; the script itself cannot wait.
                let _ = self
                    .tab
                    .wait_for_element_with_custom_timeout(selector, self.settle.element_timeout());
                css_lookup(selector)
            }
            Locator::XPath(expr) => {
                let _ = self
                    .tab
                    .wait_for_xpath_with_custom_timeout(expr, self.settle.element_timeout());
                xpath_lookup(expr)
            }
        };

        self.run_click_script(&click_script(&lookup, disabled_class), &locator.to_string())
    }

    fn select_filter(&self, selector: &str, index: usize) -> Result<AdvanceOutcome, CrawlError> {
        let script = click_script(&nth_lookup(selector, index), None);
        self.run_click_script(&script, &format!("{}[{}]", selector, index))
    }

    fn run_click_script(&self, script: &str, target: &str) -> Result<AdvanceOutcome, CrawlError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| CrawlError::ActionFailed(format!("{}: {}", target, e)))?;

        match result.value.as_ref().and_then(|v| v.as_str()) {
            Some("clicked") => Ok(AdvanceOutcome::Advanced),
            Some("disabled") => Ok(AdvanceOutcome::Exhausted),
            Some("missing") => Err(CrawlError::ElementNotFound(target.to_string())),
            other => Err(CrawlError::ActionFailed(format!(
                "{}: unexpected script result {:?}",
                target, other
            ))),
        }
    }
}

impl BrowserSession for ChromeSession {
    fn advance(&mut self, action: &AdvanceAction) -> Result<AdvanceOutcome, CrawlError> {
        let result = match action {
            AdvanceAction::ScrollToBottom => self.scroll_to_bottom(),
            AdvanceAction::Click {
                locator,
                disabled_class,
            } => self.click(locator, disabled_class.as_deref()),
            AdvanceAction::ClickViaScript {
                locator,
                disabled_class,
            } => self.click_via_script(locator, disabled_class.as_deref()),
            AdvanceAction::SelectFilter { selector, index } => self.select_filter(selector, *index),
        };

        match result {
            Ok(AdvanceOutcome::Advanced) => {
                std::thread::sleep(self.settle.after_advance());
                Ok(AdvanceOutcome::Advanced)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) if self.is_alive() => Ok(AdvanceOutcome::Failed(e)),
            Err(e) => Err(CrawlError::SessionCrash(format!("{} during {}", e, action))),
        }
    }

    fn read(&mut self) -> Result<String, CrawlError> {
        self.tab.get_content().map_err(|e| {
            if self.is_alive() {
                CrawlError::ActionFailed(format!("read page: {}", e))
            } else {
                CrawlError::SessionCrash(e.to_string())
            }
        })
    }

    fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            let _ = self.tab.close(true);
            drop(browser);
            tracing::info!("Closed browser for {}", self.url);
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Injected before any page script runs so review sites that gate content
/// on bot checks see an ordinary Chrome.
pub const STEALTH_JS: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    delete navigator.__proto__.webdriver;

    Object.defineProperty(navigator, 'plugins', {
        get: () => {
            const plugins = [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', filename: 'internal-nacl-plugin' }
            ];
            plugins.length = 3;
            return plugins;
        }
    });

    Object.defineProperty(navigator, 'languages', {
        get: () => ['ko-KR', 'ko', 'en-US', 'en']
    });

    window.chrome = { runtime: {} };

    Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => 8 });
    Object.defineProperty(navigator, 'deviceMemory', { get: () => 8 });
})();
"#;

/// Builds the script that clicks an element from page context and reports
/// `clicked`, `disabled` or `missing`.
pub fn click_script(lookup: &str, disabled_class: Option<&str>) -> String {
    let disabled = match disabled_class {
        Some(class) => format!(
            "if (el.classList.contains({})) return 'disabled';",
            js_string(class)
        ),
        None => String::new(),
    };

    format!(
        r#"(() => {{
    const el = {lookup};
    if (!el) return 'missing';
    {disabled}
    el.scrollIntoView(true);
    el.click();
    return 'clicked';
}})()"#
    )
}

pub fn css_lookup(selector: &str) -> String {
    format!("document.querySelector({})", js_string(selector))
}

pub fn xpath_lookup(expr: &str) -> String {
    format!(
        "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
        js_string(expr)
    )
}

pub fn nth_lookup(selector: &str, index: usize) -> String {
    format!("document.querySelectorAll({})[{}]", js_string(selector), index)
}

pub const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

fn js_string(value: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_quoted() {
        assert_eq!(
            css_lookup(r#"a[title="next"]"#),
            r#"document.querySelector("a[title=\"next\"]")"#
        );
    }

    #[test]
    fn test_click_script_checks_disabled_class() {
        let script = click_script(&css_lookup("button.btn-next"), Some("disabled"));
        assert!(script.contains(r#"el.classList.contains("disabled")"#));
        assert!(script.contains("return 'clicked';"));

        let script = click_script(&nth_lookup("div.switch-item", 2), None);
        assert!(!script.contains("classList"));
        assert!(script.contains(r#"document.querySelectorAll("div.switch-item")[2]"#));
    }
}

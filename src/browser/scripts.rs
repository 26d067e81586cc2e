//! JavaScript snippets evaluated inside rendered pages

/// Resolves once the document is interactive or complete
pub const WAIT_FOR_READY: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Resolves once the `load` event has fired
pub const WAIT_FOR_LOAD: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete') {
            resolve('complete');
        } else {
            window.addEventListener('load', () => resolve('complete'));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Number of resources fetched so far; stable across polls means idle
pub const RESOURCE_COUNT: &str = "performance.getEntriesByType('resource').length";

/// Common spinner/overlay selectors that must detach before printing
pub const LOADING_SELECTORS: &[&str] = &[
    "#loading",
    ".loading",
    ".loader",
    "#preloader",
    ".preloader",
    "[data-loading]",
    "[aria-busy='true']",
];

/// Short visible text matching this (case-insensitive) marks a spinner too
pub const LOADING_TEXT_PATTERN: &str = "loading";

/// Candidate selectors for a cloud viewer's Download control, most specific first
pub const DOWNLOAD_SELECTORS: &[&str] = &[
    "a[aria-label='Download']",
    "div[aria-label='Download']",
    "div[guidedhelpid='download']",
    "div[aria-label*='Download']",
    "button[aria-label='Download']",
];

/// `true` when some element matches `selector`
pub fn selector_present(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(selector))
}

/// `true` when no element matches `selector`
pub fn selector_absent(selector: &str) -> String {
    format!("document.querySelector({}) === null", js_string(selector))
}

/// `true` when the page's visible text contains `text`
pub fn text_visible(text: &str) -> String {
    format!(
        "!!(document.body && document.body.innerText.includes({}))",
        js_string(text)
    )
}

/// `true` when no visible leaf element's text matches `pattern`
///
/// The match is case-insensitive and only considers texts of at most 40
/// characters, so body copy that happens to mention the word is ignored.
pub fn no_visible_text_matching(pattern: &str) -> String {
    format!(
        r#"
        (() => {{
            const re = new RegExp({}, 'i');
            const nodes = document.body ? document.body.querySelectorAll('*') : [];
            return !Array.from(nodes).some((el) => {{
                if (el.children.length > 0 || el.getClientRects().length === 0) return false;
                const text = (el.innerText || '').trim();
                return text.length > 0 && text.length <= 40 && re.test(text);
            }});
        }})()
        "#,
        js_string(pattern)
    )
}

/// Scrolls down in `max_steps` steps to trigger lazy loading, then back to top
pub fn auto_scroll(max_steps: u32, step_px: u32, pause_ms: u32) -> String {
    format!(
        r#"
        (async () => {{
            for (let i = 0; i < {max_steps}; i++) {{
                const before = window.scrollY;
                window.scrollBy(0, {step_px});
                await new Promise((r) => setTimeout(r, {pause_ms}));
                if (window.scrollY === before) break;
            }}
            window.scrollTo(0, 0);
            return true;
        }})()
        "#
    )
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

//! Headless fetch path: full browser rendering over CDP.
//!
//! Used when the target site builds its gallery or spec tabs client-side.
//! The browser session is a scoped resource: [`HeadlessSession::close`] runs
//! on success and failure paths, and `Drop` aborts the event handler task as
//! a backstop, so a failed extraction can never leak a browser process.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use url::Url;

use crate::candidates::{
    is_excluded, passes_edge_threshold, CandidateSet, HEADLESS_EXCLUDE_KEYWORDS,
};
use crate::error::FetchError;
use crate::types::{CandidateImage, ScrapedPage};

/// Network origins blocked to save bandwidth during rendering. Stylesheets
/// are never blocked: a page that loads without CSS is a common bot signal.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*google-analytics.com*",
    "*googletagmanager.com*",
    "*doubleclick.net*",
    "*connect.facebook.net*",
    "*hotjar.com*",
    "*segment.io*",
    "*clarity.ms*",
    "*criteo.com*",
];

/// Common Chrome/Chromium install locations checked when no executable is
/// configured.
const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;

/// Delay after a tab click before re-reading the DOM.
const TAB_SETTLE_DELAY_MS: u64 = 2_000;
/// Delay before scrolling, letting initial lazy loaders fire.
const LAZY_LOAD_DELAY_MS: u64 = 2_000;

const AUTO_SCROLL_SCRIPT: &str = r"
    new Promise((resolve) => {
        let totalHeight = 0;
        const distance = 100;
        const timer = setInterval(() => {
            const scrollHeight = document.body.scrollHeight;
            window.scrollBy(0, distance);
            totalHeight += distance;
            if (totalHeight >= scrollHeight) {
                clearInterval(timer);
                resolve(true);
            }
        }, 100);
    })
";

const EXTRACT_IMAGES_SCRIPT: &str = r"
    (() => {
        const out = [];
        const elems = document.querySelectorAll('img, picture source');
        elems.forEach((elem) => {
            let src = elem.src
                || elem.getAttribute('data-src')
                || elem.getAttribute('data-lazy-src')
                || (elem.getAttribute('data-srcset') || '').split(',')[0].split(' ')[0]
                || (elem.getAttribute('srcset') || '').split(',')[0].split(' ')[0]
                || '';
            if (!src || src === window.location.href) { return; }
            if (!src.startsWith('http')) {
                try { src = new URL(src, window.location.origin).href; }
                catch (e) { return; }
            }
            if (!src.startsWith('http') || src.length <= 20) { return; }
            const width = elem.naturalWidth || parseInt(elem.getAttribute('width') || '0', 10);
            const height = elem.naturalHeight || parseInt(elem.getAttribute('height') || '0', 10);
            const alt = elem.getAttribute('alt') || '';
            out.push({ url: src, width: width, height: height, alt: alt });
        });
        return out;
    })()
";

const TITLE_SCRIPT: &str = r"
    (() => {
        const h1 = document.querySelector('h1');
        const title = document.querySelector('title');
        return (h1 && h1.textContent.trim()) || (title && title.textContent.trim()) || '';
    })()
";

const CONTENT_SCRIPT: &str = r"
    (() => {
        const main = document.querySelector('main')
            || document.querySelector('article')
            || document.body;
        return main ? main.innerHTML : '';
    })()
";

/// Settings for the headless path, taken from `AppConfig`.
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub user_agent: String,
    pub nav_timeout_secs: u64,
    pub render_delay_ms: u64,
    pub chrome_executable: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    alt: String,
}

/// Browser session owning the process handle and its CDP event loop.
struct HeadlessSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl HeadlessSession {
    async fn launch(options: &HeadlessOptions) -> Result<Self, String> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        let executable = options
            .chrome_executable
            .clone()
            .or_else(detect_chrome);
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("browser launch failed: {e}"))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Tears the browser down. Called on every exit path.
    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

impl Drop for HeadlessSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// Headless page fetcher.
pub struct HeadlessFetcher {
    options: HeadlessOptions,
}

impl HeadlessFetcher {
    #[must_use]
    pub fn new(options: HeadlessOptions) -> Self {
        Self { options }
    }

    /// Renders `url` in a headless browser and extracts content plus image
    /// candidates from the live DOM.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] if navigation exceeds the configured budget.
    /// - [`FetchError::Browser`] on launch, navigation, or extraction failure.
    pub async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let session = HeadlessSession::launch(&self.options)
            .await
            .map_err(|reason| FetchError::Browser {
                url: url.to_string(),
                reason,
            })?;

        let result = self.extract(&session.browser, url).await;
        session.close().await;
        result
    }

    async fn extract(&self, browser: &Browser, url: &str) -> Result<ScrapedPage, FetchError> {
        let browser_err = |e: &dyn std::fmt::Display| FetchError::Browser {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_err(&e))?;

        let result = self.extract_on_page(&page, url).await;
        // The page must go down with the session even when extraction fails.
        let _ = page.close().await;
        result
    }

    async fn extract_on_page(&self, page: &Page, url: &str) -> Result<ScrapedPage, FetchError> {
        let browser_err = |e: &dyn std::fmt::Display| FetchError::Browser {
            url: url.to_string(),
            reason: e.to_string(),
        };

        page.set_user_agent(self.options.user_agent.as_str())
            .await
            .map_err(|e| browser_err(&e))?;

        let patterns: Vec<String> = BLOCKED_URL_PATTERNS
            .iter()
            .map(ToString::to_string)
            .collect();
        page.execute(SetBlockedUrLsParams::new(patterns))
            .await
            .map_err(|e| browser_err(&e))?;

        let budget = Duration::from_secs(self.options.nav_timeout_secs);
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(budget, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(browser_err(&e)),
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    budget_secs: self.options.nav_timeout_secs,
                })
            }
        }

        // Fixed delay for client-side rendering after the load events fire.
        tokio::time::sleep(Duration::from_millis(self.options.render_delay_ms)).await;

        if let Some(fragment) = url.split('#').nth(1).and_then(sanitize_fragment) {
            let clicked: bool = page
                .evaluate(build_tab_click_script(&fragment))
                .await
                .map_err(|e| browser_err(&e))?
                .into_value()
                .unwrap_or(false);
            if clicked {
                tracing::debug!(url, fragment, "tab control clicked");
                tokio::time::sleep(Duration::from_millis(TAB_SETTLE_DELAY_MS)).await;
            } else {
                tracing::debug!(url, fragment, "no tab control matched; scraping full page");
            }
        }

        tokio::time::sleep(Duration::from_millis(LAZY_LOAD_DELAY_MS)).await;
        page.evaluate(AUTO_SCROLL_SCRIPT)
            .await
            .map_err(|e| browser_err(&e))?;

        let raw: Vec<RawCandidate> = page
            .evaluate(EXTRACT_IMAGES_SCRIPT)
            .await
            .map_err(|e| browser_err(&e))?
            .into_value()
            .map_err(|e| browser_err(&e))?;

        let images = filter_candidates(raw);

        let title: String = page
            .evaluate(TITLE_SCRIPT)
            .await
            .map_err(|e| browser_err(&e))?
            .into_value()
            .unwrap_or_default();

        let html: String = page
            .evaluate(CONTENT_SCRIPT)
            .await
            .map_err(|e| browser_err(&e))?
            .into_value()
            .unwrap_or_default();

        tracing::info!(url, candidates = images.len(), "headless scrape complete");

        Ok(ScrapedPage {
            html,
            title,
            images,
            sections: Vec::new(),
        })
    }
}

/// Applies the expanded exclusion list, the rendered-dimension threshold,
/// dedup, area sort, and the candidate cap to raw DOM extractions.
fn filter_candidates(raw: Vec<RawCandidate>) -> Vec<CandidateImage> {
    let mut set = CandidateSet::new();
    for item in raw {
        if is_excluded(&item.url, &item.alt, HEADLESS_EXCLUDE_KEYWORDS) {
            continue;
        }
        let width = (item.width > 0).then_some(item.width);
        let height = (item.height > 0).then_some(item.height);
        if !passes_edge_threshold(width, height) {
            continue;
        }
        set.push(CandidateImage {
            url: item.url,
            width,
            height,
        });
    }
    set.finalize()
}

/// Fragments are only used when they are plain slug-like identifiers;
/// anything else cannot be safely inlined into the selector script.
fn sanitize_fragment(fragment: &str) -> Option<String> {
    if fragment.is_empty()
        || !fragment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(fragment.to_string())
}

/// JS that tries a small set of selector heuristics to click the tab or
/// section control matching a URL fragment (e.g. `#marketing-images`).
fn build_tab_click_script(fragment: &str) -> String {
    let label = fragment.replace(['-', '_'], " ");
    format!(
        r#"(() => {{
            const selectors = [
                'a[href*="{fragment}"]',
                'button[data-tab="{fragment}"]',
                '[role="tab"][aria-controls*="{fragment}"]',
                '[id="{fragment}"] [role="tab"]',
            ];
            for (const selector of selectors) {{
                try {{
                    const el = document.querySelector(selector);
                    if (el) {{ el.click(); return true; }}
                }} catch (e) {{ /* try the next selector */ }}
            }}
            const label = "{label}".toLowerCase();
            for (const btn of document.querySelectorAll('button, [role="tab"]')) {{
                if ((btn.textContent || '').trim().toLowerCase() === label) {{
                    btn.click();
                    return true;
                }}
            }}
            return false;
        }})()"#
    )
}

fn detect_chrome() -> Option<String> {
    CHROME_PATHS
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_patterns_never_cover_stylesheets() {
        for pattern in BLOCKED_URL_PATTERNS {
            assert!(!pattern.contains(".css"), "{pattern} would block CSS");
        }
    }

    #[test]
    fn fragment_sanitization() {
        assert_eq!(
            sanitize_fragment("marketing-images").as_deref(),
            Some("marketing-images")
        );
        assert_eq!(sanitize_fragment("spec_tab2").as_deref(), Some("spec_tab2"));
        assert_eq!(sanitize_fragment(""), None);
        assert_eq!(sanitize_fragment("x\"]; alert(1); //"), None);
    }

    #[test]
    fn tab_click_script_embeds_fragment_selectors() {
        let script = build_tab_click_script("marketing-images");
        assert!(script.contains(r#"a[href*="marketing-images"]"#));
        assert!(script.contains(r#"button[data-tab="marketing-images"]"#));
        assert!(script.contains("marketing images"));
    }

    #[test]
    fn filter_candidates_applies_threshold_and_keywords() {
        let raw = vec![
            RawCandidate {
                url: "https://c.example/media/pack-shot.jpg".into(),
                width: 1200,
                height: 1200,
                alt: String::new(),
            },
            RawCandidate {
                url: "https://c.example/media/thumbnail-pack.jpg".into(),
                width: 1200,
                height: 1200,
                alt: String::new(),
            },
            RawCandidate {
                url: "https://c.example/media/small.jpg".into(),
                width: 200,
                height: 200,
                alt: String::new(),
            },
            RawCandidate {
                url: "https://c.example/media/unknown-size.jpg".into(),
                width: 0,
                height: 0,
                alt: String::new(),
            },
        ];
        let images = filter_candidates(raw);
        let urls: Vec<&str> = images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://c.example/media/pack-shot.jpg",
                "https://c.example/media/unknown-size.jpg",
            ]
        );
    }
}

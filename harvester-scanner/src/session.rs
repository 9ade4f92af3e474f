use crate::error::{Result, ScanError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// An interactive page the harvester drives.
///
/// Every operation acts on the single page the session currently holds.
/// Calls are sequential; `&mut self` keeps it that way.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Load `url` and wait for the navigation to settle.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Suspend for `duration`. Fakes may record instead of sleeping.
    async fn sleep(&mut self, duration: Duration);

    /// Number of elements currently rendered that match `selector`.
    async fn evaluate_count(&mut self, selector: &str) -> Result<usize>;

    /// Run a page action for its side effect. An error means the page refused it.
    async fn evaluate_trigger(&mut self, script: &str) -> Result<()>;

    /// Outer HTML of the first element matching `selector`.
    async fn read_content(&mut self, selector: &str) -> Result<String>;
}

/// Headless Chrome over the DevTools protocol.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScanError::LaunchError)?;

        info!("Launching Chrome (headless: {})", headless);
        let (browser, mut handler) = Browser::launch(config).await?;

        // The CDP connection only makes progress while the handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.await?;
        Ok(())
    }
}

impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn evaluate_count(&mut self, selector: &str) -> Result<usize> {
        let script = count_script(selector)?;
        let count = self.page.evaluate(script.as_str()).await?.into_value::<usize>()?;
        Ok(count)
    }

    async fn evaluate_trigger(&mut self, script: &str) -> Result<()> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScanError::ScriptError(e.to_string()))?;
        Ok(())
    }

    async fn read_content(&mut self, selector: &str) -> Result<String> {
        let element = self.page.find_element(selector).await?;
        element
            .outer_html()
            .await?
            .ok_or_else(|| ScanError::MissingContent(selector.to_string()))
    }
}

/// JavaScript expression counting the elements that match `selector`.
pub fn count_script(selector: &str) -> Result<String> {
    let quoted = serde_json::to_string(selector)?;
    Ok(format!("document.querySelectorAll({}).length", quoted))
}

/// Plain HTTP fetches with no script engine.
///
/// Counts and content come from the HTML as served. Triggers always fail,
/// so pagination stops after the first page.
pub struct HttpSession {
    client: Client,
    body: Option<String>,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Harvester/0.1 (https://github.com/trapdoorsec/harvester)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, body: None })
    }

    fn document(&self) -> Result<Html> {
        let body = self.body.as_deref().ok_or(ScanError::NoPage)?;
        Ok(Html::parse_document(body))
    }
}

impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Fetching {}", url);
        // A failed fetch leaves no page behind.
        self.body = None;
        let response = self.client.get(url).send().await?.error_for_status()?;
        self.body = Some(response.text().await?);
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn evaluate_count(&mut self, selector: &str) -> Result<usize> {
        let selector = parse_selector(selector)?;
        Ok(self.document()?.select(&selector).count())
    }

    async fn evaluate_trigger(&mut self, script: &str) -> Result<()> {
        Err(ScanError::ScriptError(format!(
            "static session cannot run '{}'",
            script
        )))
    }

    async fn read_content(&mut self, selector: &str) -> Result<String> {
        let parsed = parse_selector(selector)?;
        self.document()?
            .select(&parsed)
            .next()
            .map(|element| element.html())
            .ok_or_else(|| ScanError::MissingContent(selector.to_string()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScanError::ScriptError(format!("bad selector '{}': {}", selector, e)))
}

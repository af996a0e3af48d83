//! Remote rendering through a Browserless instance.
//!
//! Every page action is one `POST /function` call. The service runs
//! [`PAGE_SCRIPT`] in a fresh Puppeteer page with a context object built from
//! the page's recorded state:
//!
//! | Context key | Puppeteer call |
//! |-------------|----------------|
//! | `viewport` | `page.setViewport` |
//! | `userAgent` | `page.setUserAgent` |
//! | `cookies` | `page.setCookie` |
//! | `headers` | request interception, main-frame navigations only |
//! | `url`, `waitUntil` | `page.goto` |
//! | `click` | `page.$` + `click`, awaiting the navigation it triggers |
//!
//! The script answers with the final URL, the rendered HTML and whether the
//! click target existed. Launch options travel in the `launch` query
//! parameter, the API token in `token`.
//!
//! Because sessions are not kept between calls, [`BrowserlessPage`] replays
//! its settings on every call and a click re-opens the current URL before
//! clicking.

use super::{Browser, BrowserPage, Cookie, LaunchOptions, Viewport, WaitUntil};
use crate::error::BrowserError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Puppeteer module executed by the `/function` endpoint.
pub const PAGE_SCRIPT: &str = r#"export default async function ({ page, context }) {
  await page.setViewport(context.viewport);
  if (context.userAgent) {
    await page.setUserAgent(context.userAgent);
  }
  if (context.cookies.length > 0) {
    await page.setCookie(...context.cookies);
  }
  if (Object.keys(context.headers).length > 0) {
    await page.setRequestInterception(true);
    page.on('request', (request) => {
      if (request.isNavigationRequest() && request.frame() === page.mainFrame()) {
        request.continue({ headers: { ...request.headers(), ...context.headers } });
      } else {
        request.continue();
      }
    });
  }

  await page.goto(context.url, { waitUntil: context.waitUntil });

  let clicked = null;
  if (context.click) {
    const target = await page.$(context.click);
    clicked = target !== null;
    if (clicked) {
      await Promise.all([
        page.waitForNavigation({ waitUntil: context.waitUntil }),
        target.click(),
      ]);
    }
  }

  return {
    data: { url: page.url(), html: await page.content(), clicked },
    type: 'application/json',
  };
}"#;

/// Handle to a Browserless service.
#[derive(Debug, Clone)]
pub struct BrowserlessBrowser {
    client: reqwest::Client,
    function_endpoint: String,
}

impl BrowserlessBrowser {
    /// Prepare a client for the service at `options.endpoint`.
    ///
    /// No connection is made here; the first request happens on
    /// [`BrowserPage::goto`].
    ///
    /// # Arguments
    ///
    /// * `options` - Service endpoint, token and Chrome launch flags
    ///
    /// # Returns
    ///
    /// The browser handle, or [`BrowserError::Network`] when the endpoint is
    /// not a valid URL or the HTTP client cannot be built.
    pub fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let function_endpoint = function_endpoint(options)?;
        debug!(endpoint = %options.endpoint, headless = options.headless, "Browserless client ready");
        Ok(Self {
            client,
            function_endpoint,
        })
    }
}

fn function_endpoint(options: &LaunchOptions) -> Result<String, BrowserError> {
    let base = format!("{}/function", options.endpoint.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .map_err(|e| BrowserError::Network(format!("invalid browser endpoint {base}: {e}")))?;

    let launch = json!({ "headless": options.headless, "args": options.args });
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(token) = &options.token {
            pairs.append_pair("token", token);
        }
        pairs.append_pair("launch", &launch.to_string());
    }
    Ok(url.to_string())
}

impl Browser for BrowserlessBrowser {
    type Page = BrowserlessPage;

    async fn new_page(&self) -> Result<BrowserlessPage, BrowserError> {
        Ok(BrowserlessPage {
            client: self.client.clone(),
            endpoint: self.function_endpoint.clone(),
            viewport: Viewport::default(),
            user_agent: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            current: None,
        })
    }

    async fn close(self) -> Result<(), BrowserError> {
        // sessions end with each request; nothing is held open
        Ok(())
    }
}

/// Page state replayed on every call.
#[derive(Debug)]
pub struct BrowserlessPage {
    client: reqwest::Client,
    endpoint: String,
    viewport: Viewport,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    current: Option<Rendered>,
}

/// What the page script hands back.
#[derive(Debug, Clone, Deserialize)]
struct Rendered {
    url: String,
    html: String,
    #[serde(default)]
    clicked: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptContext<'a> {
    url: &'a str,
    wait_until: &'static str,
    viewport: Viewport,
    user_agent: Option<&'a str>,
    headers: Map<String, Value>,
    cookies: &'a [Cookie],
    click: Option<&'a str>,
}

impl BrowserlessPage {
    fn request_body(&self, url: &str, wait: WaitUntil, click: Option<&str>) -> Value {
        let context = ScriptContext {
            url,
            wait_until: wait.as_str(),
            viewport: self.viewport,
            user_agent: self.user_agent.as_deref(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            cookies: &self.cookies,
            click,
        };
        json!({ "code": PAGE_SCRIPT, "context": context })
    }

    async fn run(
        &self,
        url: &str,
        wait: WaitUntil,
        click: Option<&str>,
    ) -> Result<Rendered, BrowserError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(url, wait, click))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rendered: Rendered = resp.json().await?;
        debug!(url = %rendered.url, bytes = rendered.html.len(), "Rendered page");
        Ok(rendered)
    }
}

impl BrowserPage for BrowserlessPage {
    async fn set_viewport(&mut self, viewport: Viewport) -> Result<(), BrowserError> {
        self.viewport = viewport;
        Ok(())
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), BrowserError> {
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_extra_headers(
        &mut self,
        headers: Vec<(String, String)>,
    ) -> Result<(), BrowserError> {
        self.headers = headers;
        Ok(())
    }

    async fn set_cookie(&mut self, cookie: Cookie) -> Result<(), BrowserError> {
        self.cookies.retain(|c| c.name != cookie.name || c.domain != cookie.domain);
        self.cookies.push(cookie);
        Ok(())
    }

    #[instrument(level = "debug", skip(self, wait), fields(wait = wait.as_str()))]
    async fn goto(&mut self, url: &str, wait: WaitUntil) -> Result<(), BrowserError> {
        self.current = Some(self.run(url, wait, None).await?);
        Ok(())
    }

    #[instrument(level = "debug", skip(self, wait), fields(wait = wait.as_str()))]
    async fn click_and_wait(&mut self, selector: &str, wait: WaitUntil) -> Result<(), BrowserError> {
        let url = match &self.current {
            Some(rendered) => rendered.url.clone(),
            None => return Err(BrowserError::NotNavigated),
        };

        let rendered = self.run(&url, wait, Some(selector)).await?;
        if rendered.clicked != Some(true) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.current = Some(rendered);
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.current
            .as_ref()
            .map(|rendered| rendered.html.clone())
            .ok_or(BrowserError::NotNavigated)
    }

    async fn close(self) -> Result<(), BrowserError> {
        Ok(())
    }
}

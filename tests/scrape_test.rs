use gnews_scraper::browser::{CONSENT_REJECT_SELECTOR, Cookie, Viewport, WaitUntil};
use gnews_scraper::{
    Article, Browser, BrowserError, BrowserPage, LinkResolver, ResolveError, ScrapeError,
    UserConfig, scrape,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// What the fake browser saw during one scrape.
#[derive(Debug, Default)]
struct Log {
    visits: Vec<String>,
    cookies: Vec<Cookie>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    consent_attempts: usize,
    consent_dismissed: bool,
    page_closed: bool,
    browser_closed: bool,
}

const CONSENT_WALL: &str = r#"<html><body>
  <form><button aria-label="Reject all">Reject all</button></form>
</body></html>"#;

/// Serves canned HTML keyed by URL prefix, optionally behind a consent wall
/// that shows until "Reject all" is clicked.
struct FakeBrowser {
    pages: Rc<HashMap<String, String>>,
    log: Rc<RefCell<Log>>,
    consent_wall: bool,
}

struct FakePage {
    pages: Rc<HashMap<String, String>>,
    log: Rc<RefCell<Log>>,
    consent_wall: bool,
    last_url: Option<String>,
    current: Option<String>,
}

impl FakePage {
    fn render(&self, url: &str) -> Result<String, BrowserError> {
        if self.consent_wall && !self.log.borrow().consent_dismissed {
            return Ok(CONSENT_WALL.to_string());
        }
        self.pages
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, html)| html.clone())
            .ok_or_else(|| BrowserError::Api {
                status: 502,
                message: format!("no page for {url}"),
            })
    }
}

impl FakeBrowser {
    fn new(pages: &[(&str, &str)]) -> (Self, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let pages = pages
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        (
            Self {
                pages: Rc::new(pages),
                log: Rc::clone(&log),
                consent_wall: false,
            },
            log,
        )
    }

    fn with_consent_wall(mut self) -> Self {
        self.consent_wall = true;
        self
    }
}

impl Browser for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&self) -> Result<FakePage, BrowserError> {
        Ok(FakePage {
            pages: Rc::clone(&self.pages),
            log: Rc::clone(&self.log),
            consent_wall: self.consent_wall,
            last_url: None,
            current: None,
        })
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.log.borrow_mut().browser_closed = true;
        Ok(())
    }
}

impl BrowserPage for FakePage {
    async fn set_viewport(&mut self, _: Viewport) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn set_user_agent(&mut self, user_agent: &str) -> Result<(), BrowserError> {
        self.log.borrow_mut().user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_extra_headers(&mut self, headers: Vec<(String, String)>) -> Result<(), BrowserError> {
        self.log.borrow_mut().headers = headers;
        Ok(())
    }

    async fn set_cookie(&mut self, cookie: Cookie) -> Result<(), BrowserError> {
        self.log.borrow_mut().cookies.push(cookie);
        Ok(())
    }

    async fn goto(&mut self, url: &str, _: WaitUntil) -> Result<(), BrowserError> {
        self.log.borrow_mut().visits.push(url.to_string());
        self.current = Some(self.render(url)?);
        self.last_url = Some(url.to_string());
        Ok(())
    }

    async fn click_and_wait(&mut self, selector: &str, _: WaitUntil) -> Result<(), BrowserError> {
        self.log.borrow_mut().consent_attempts += 1;
        let on_wall = self
            .current
            .as_deref()
            .is_some_and(|html| html.contains(r#"aria-label="Reject all""#));
        if selector != CONSENT_REJECT_SELECTOR || !on_wall {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }

        self.log.borrow_mut().consent_dismissed = true;
        let url = self.last_url.clone().ok_or(BrowserError::NotNavigated)?;
        self.current = Some(self.render(&url)?);
        Ok(())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.current.clone().ok_or(BrowserError::NotNavigated)
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.log.borrow_mut().page_closed = true;
        Ok(())
    }
}

/// Maps `/read/<id>` to `https://publisher.test/<id>`, failing for ids in `broken`.
struct MapResolver {
    broken: Vec<&'static str>,
}

impl LinkResolver for MapResolver {
    async fn resolve(&self, link: &str) -> Result<String, ResolveError> {
        let id = link.rsplit('/').next().unwrap_or_default();
        if self.broken.contains(&id) {
            return Err(ResolveError::Unresolved(link.to_string()));
        }
        Ok(format!("https://publisher.test/{id}"))
    }
}

const SEARCH: &str = "https://news.google.com/search";

const MODERN_PAGE: &str = r#"
<html><body><main>
  <div class="card">
    <div><div data-n-tid="9">Reuters</div></div>
    <div><a href="./read/ABC">Hello</a></div>
    <div><time datetime="2024-01-01T00:00:00Z">1 day ago</time></div>
  </div>
</main></body></html>"#;

fn card(id: &str, title: &str) -> String {
    format!(
        r#"<div class="card"><a href="./read/{id}">{title}</a>
           <div data-n-tid="1">Src {id}</div>
           <time datetime="2024-02-0{id}T08:00:00Z">{id}h ago</time></div>"#
    )
}

fn listing(cards: &[(&str, &str)]) -> String {
    let body: String = cards.iter().map(|(id, title)| card(id, title)).collect();
    format!("<html><body>{body}</body></html>")
}

fn no_resolution() -> UserConfig {
    UserConfig {
        pretty_urls: Some(false),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_modern_scenario_end_to_end() {
    let (browser, log) = FakeBrowser::new(&[(SEARCH, MODERN_PAGE)]);
    let resolver = MapResolver { broken: vec![] };

    let articles = scrape(browser, &resolver, no_resolution()).await.unwrap();

    assert_eq!(
        articles,
        vec![Article {
            title: "Hello".to_string(),
            link: "https://news.google.com/read/ABC".to_string(),
            image: String::new(),
            source: "Reuters".to_string(),
            datetime: "2024-01-01T00:00:00.000Z".to_string(),
            time: "1 day ago".to_string(),
            article_type: "topic".to_string(),
            content: None,
        }]
    );

    let log = log.borrow();
    assert_eq!(log.visits, vec!["https://news.google.com/search?when=7d"]);
    assert_eq!(log.cookies.len(), 1);
    assert_eq!(log.cookies[0].name, "CONSENT");
    assert!(log.user_agent.is_some());
    assert!(log.headers.iter().any(|(k, _)| k == "Accept-Language"));
    assert_eq!(log.consent_attempts, 1);
    assert!(!log.consent_dismissed);
    assert!(log.page_closed);
    assert!(log.browser_closed);
}

#[tokio::test]
async fn test_consent_wall_is_dismissed_before_extraction() {
    let (browser, log) = FakeBrowser::new(&[(SEARCH, MODERN_PAGE)]);
    let browser = browser.with_consent_wall();

    let articles = scrape(browser, &MapResolver { broken: vec![] }, no_resolution())
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].source, "Reuters");
    let log = log.borrow();
    assert_eq!(log.consent_attempts, 1);
    assert!(log.consent_dismissed);
}

#[tokio::test]
async fn test_search_term_builds_query() {
    let (browser, log) = FakeBrowser::new(&[(SEARCH, MODERN_PAGE)]);
    let user = UserConfig {
        search_term: Some("open source".to_string()),
        timeframe: Some("1d".to_string()),
        pretty_urls: Some(false),
        ..Default::default()
    };

    scrape(browser, &MapResolver { broken: vec![] }, user).await.unwrap();

    assert_eq!(
        log.borrow().visits,
        vec!["https://news.google.com/search?when=1d&q=open%20source"]
    );
}

#[tokio::test]
async fn test_empty_page_yields_empty_result() {
    let (browser, _) = FakeBrowser::new(&[(SEARCH, "<html><body><p>No results</p></body></html>")]);
    let articles = scrape(browser, &MapResolver { broken: vec![] }, UserConfig::default())
        .await
        .unwrap();
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_limit_two_of_five() {
    let page = listing(&[("1", "One"), ("2", "Two"), ("3", "Three"), ("4", "Four"), ("5", "Five")]);
    let (browser, _) = FakeBrowser::new(&[(SEARCH, &page)]);
    let user = UserConfig {
        limit: Some(2),
        pretty_urls: Some(false),
        ..Default::default()
    };

    let articles = scrape(browser, &MapResolver { broken: vec![] }, user).await.unwrap();

    let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert_eq!(articles[1].source, "Src 2");
    assert_eq!(articles[1].datetime, "2024-02-02T08:00:00.000Z");
}

#[tokio::test]
async fn test_one_failed_resolution_keeps_original_link() {
    let page = listing(&[("1", "One"), ("2", "Two"), ("3", "Three")]);
    let (browser, _) = FakeBrowser::new(&[(SEARCH, &page)]);
    let resolver = MapResolver { broken: vec!["2"] };

    let articles = scrape(browser, &resolver, UserConfig::default()).await.unwrap();

    let links: Vec<&str> = articles.iter().map(|a| a.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://publisher.test/1",
            "https://news.google.com/read/2",
            "https://publisher.test/3",
        ]
    );
}

#[tokio::test]
async fn test_enrichment_filters_by_keyword() {
    let page = listing(&[("1", "One"), ("2", "Two"), ("3", "Three")]);
    let (browser, log) = FakeBrowser::new(&[
        (SEARCH, &page),
        ("https://publisher.test/1", "<article><p>Heavy FLOODING downtown</p></article>"),
        ("https://publisher.test/2", "<article><p>Election results</p></article>"),
    ]);
    let user = UserConfig {
        get_article_content: Some(true),
        filter_words: Some(vec!["flood".to_string()]),
        ..Default::default()
    };

    let articles = scrape(browser, &MapResolver { broken: vec![] }, user).await.unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "One");
    assert_eq!(articles[0].content.as_deref(), Some("Heavy FLOODING downtown"));
    // article 3 has no page and is dropped without failing the batch
    assert_eq!(log.borrow().visits.len(), 4);
    assert!(log.borrow().page_closed);
}

#[tokio::test]
async fn test_navigation_failure_is_fatal_and_releases_browser() {
    let (browser, log) = FakeBrowser::new(&[]);

    let err = scrape(browser, &MapResolver { broken: vec![] }, UserConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Browser(BrowserError::Api { status: 502, .. })));
    let log = log.borrow();
    assert!(log.page_closed);
    assert!(log.browser_closed);
}

#[tokio::test]
async fn test_topic_page_base_url() {
    let topic = "https://news.google.com/topics/CAAqIggK";
    let (browser, log) = FakeBrowser::new(&[(topic, MODERN_PAGE)]);
    let user = UserConfig {
        base_url: Some(topic.to_string()),
        query_vars: Some([("hl", "en-US"), ("gl", "US")].into_iter().collect()),
        pretty_urls: Some(false),
        ..Default::default()
    };

    let articles = scrape(browser, &MapResolver { broken: vec![] }, user).await.unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(
        log.borrow().visits,
        vec!["https://news.google.com/topics/CAAqIggK?hl=en-US&gl=US&when=7d"]
    );
}

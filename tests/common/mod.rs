#![allow(dead_code)]
use async_trait::async_trait;
use http_client::{HttpClient, Request, Response};
use lfcircle::{LfCircleError, ReportFetcher, Result};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Figures to put on a fixture listening report page.
#[derive(Debug, Clone)]
pub struct PageFixture {
    pub scrobbles: u64,
    pub artists: u64,
    pub albums: u64,
    pub tracks: u64,
    /// (artist, album, track) of the top entities
    pub top: Option<(&'static str, &'static str, &'static str)>,
    /// (days, hours) of listening time
    pub listening: Option<(u64, u64)>,
}

impl PageFixture {
    pub fn new(scrobbles: u64, artists: u64, albums: u64, tracks: u64) -> Self {
        Self {
            scrobbles,
            artists,
            albums,
            tracks,
            top: Some(("Radiohead", "In Rainbows", "Reckoner")),
            listening: None,
        }
    }

    pub fn top(mut self, artist: &'static str, album: &'static str, track: &'static str) -> Self {
        self.top = Some((artist, album, track));
        self
    }

    pub fn listening(mut self, days: u64, hours: u64) -> Self {
        self.listening = Some((days, hours));
        self
    }
}

fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn slug(text: &str) -> String {
    text.replace(' ', "+")
}

/// Render a listening report page shaped like the real thing.
pub fn report_page(fixture: &PageFixture) -> String {
    let mut page = String::from("<!DOCTYPE html><html><head><title>Listening Report</title></head><body>");

    page.push_str(&format!(
        r#"<section class="report-headline"><h2><span class="report-headline-total">{}</span> scrobbles</h2></section>"#,
        with_commas(fixture.scrobbles)
    ));

    if let Some((days, hours)) = fixture.listening {
        page.push_str(&format!(
            r#"<div class="report-box-container report-box-container--quick-fact">
                 <h4 class="quick-fact-title">Listening time</h4>
                 <p class="quick-fact-data-value">{days} days</p>
                 <p class="quick-fact-data-detail">{hours} hours</p>
               </div>"#
        ));
    }

    for (kind, count) in [
        ("artist", fixture.artists),
        ("album", fixture.albums),
        ("track", fixture.tracks),
    ] {
        page.push_str(&format!(
            r#"<div class="listening-report-row__col--top-items">
                 <div class="top-item-overview top-item-overview--{kind}">
                   <span class="top-item-overview__scrobbles">{}</span> {kind}s
                 </div>
               </div>"#,
            with_commas(count)
        ));
    }

    if let Some((artist, album, track)) = fixture.top {
        let blocks = [
            ("artist", artist, format!("/music/{}", slug(artist)), "Artist"),
            ("album", album, format!("/music/{}/{}", slug(artist), slug(album)), "Album"),
            ("track", track, format!("/music/{}/_/{}", slug(artist), slug(track)), "Track"),
        ];
        for (kind, name, href, label) in blocks {
            page.push_str(&format!(
                r#"<div id="top-{kind}" class="top-item-modal">
                     <h3 class="top-item-modal-header">
                       {name}
                     </h3>
                     <ul><li><span class="top-item-modal-data-item-value">42</span> scrobbles</li></ul>
                     <a class="top-item-modal-link-text" href="{href}">View {label} page</a>
                   </div>"#
            ));
        }
    }

    page.push_str("</body></html>");
    page
}

/// A [`ReportFetcher`] serving canned pages, optionally after a per-user delay.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, user: &str, markup: impl Into<String>) -> Self {
        self.pages.insert(user.to_string(), markup.into());
        self
    }

    pub fn with_report(self, user: &str, fixture: PageFixture) -> Self {
        self.with_page(user, report_page(&fixture))
    }

    pub fn with_delay(mut self, user: &str, delay: Duration) -> Self {
        self.delays.insert(user.to_string(), delay);
        self
    }

    /// Users fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ReportFetcher for FakeFetcher {
    async fn fetch(&self, user: &str) -> Result<String> {
        self.calls.borrow_mut().push(user.to_string());

        if let Some(delay) = self.delays.get(user) {
            tokio::time::sleep(*delay).await;
        }

        self.pages.get(user).cloned().ok_or_else(|| {
            LfCircleError::Retrieval(format!("non-nominal status code 404 for '{user}'"))
        })
    }
}

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CannedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// An [`HttpClient`] answering from a queue of canned responses per URL.
///
/// Unknown URLs (or exhausted queues) get a 404.
#[derive(Debug, Default)]
pub struct FixtureHttpClient {
    responses: Mutex<HashMap<String, VecDeque<CannedResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: CannedResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Shared log of requested URLs, usable after the client has been boxed.
    pub fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl HttpClient for FixtureHttpClient {
    async fn send(&self, req: Request) -> std::result::Result<Response, http_types::Error> {
        let url = req.url().to_string();
        self.requests.lock().unwrap().push(url.clone());

        let canned = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| CannedResponse::status(404, "<h1>Page not found</h1>"));

        let mut response = Response::new(canned.status);
        for (name, value) in &canned.headers {
            response.insert_header(name.as_str(), value.as_str());
        }
        response.set_body(canned.body);
        Ok(response)
    }
}

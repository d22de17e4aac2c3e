//! Scripted in-process [`HttpClient`] for unit tests.

use super::HttpClient;
use async_trait::async_trait;
use reqwest::ResponseBuilderExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One canned response.
pub enum Reply {
    Status(u16, String),
    Transport,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Status(200, body.into())
    }

    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Reply::Status(code, body.into())
    }
}

/// What the client saw for each request.
pub struct Seen {
    pub url: String,
    pub auth: Option<String>,
    pub timeout: Option<Duration>,
}

/// Replays [`Reply`] values in order; answers `200 ""` once they run out.
#[derive(Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<Seen>>,
}

impl MockClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> std::sync::MutexGuard<'_, Vec<Seen>> {
        self.seen.lock().unwrap()
    }
}

fn response(url: &reqwest::Url, code: u16, body: String) -> reqwest::Response {
    http::Response::builder()
        .url(url.clone())
        .status(code)
        .body(body)
        .unwrap()
        .into()
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.seen.lock().unwrap().push(Seen {
            url: req.url().to_string(),
            auth: req
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_string()),
            timeout: req.timeout().copied(),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Status(code, body)) => Ok(response(req.url(), code, body)),
            // reqwest errors have no public constructor; borrow one from a 503.
            // Like a real send error, it carries the request URL.
            Some(Reply::Transport) => Err(response(req.url(), 503, String::new())
                .error_for_status()
                .unwrap_err()),
            None => Ok(response(req.url(), 200, String::new())),
        }
    }
}

//! In-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::client::{HttpResponse, Transport};
use crate::error::Result;

#[derive(Default)]
struct Route {
    replies: VecDeque<HttpResponse>,
    latency: Duration,
}

/// Scripted transport. Each URL answers with its queued replies in order;
/// the last reply repeats. Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `url`.
    pub(crate) fn reply(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .replies
            .push_back(HttpResponse::new(status, body));
        self
    }

    /// Delay every reply for `url`.
    pub(crate) fn latency(self, url: &str, latency: Duration) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .latency = latency;
        self
    }

    /// Every request seen so far, with the (tokio) time it was issued.
    pub(crate) fn requests(&self) -> Vec<(String, Instant)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let (reply, latency) = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(route) => {
                    let reply = if route.replies.len() > 1 {
                        route.replies.pop_front()
                    } else {
                        route.replies.front().cloned()
                    };
                    (reply, route.latency)
                }
                None => (None, Duration::ZERO),
            }
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(reply.unwrap_or_else(|| HttpResponse::new(404, r#"{"error":"not found"}"#)))
    }
}

/// JSON body of a character with the given id.
pub(crate) fn character_json(id: u32) -> String {
    format!(
        r#"{{"id":{id},"name":"Character {id}","status":"Alive","species":"Human","gender":"Male","image":"","episode":[]}}"#
    )
}

/// Absolute URL of a character on the fake host.
pub(crate) fn character_url(id: u32) -> String {
    format!("http://fake/api/character/{id}")
}

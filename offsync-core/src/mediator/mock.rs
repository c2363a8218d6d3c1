// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Fetcher
//!
//! Serves canned responses keyed by URL and records every call, so tests can
//! assert whether the network was touched.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use super::error::FetchError;
use super::fetcher::Fetcher;
use super::request::{Request, Response, ResponseType};

#[derive(Default)]
struct MockState {
    routes: HashMap<String, Response>,
    failing: Vec<String>,
    offline: bool,
    calls: Vec<(String, String)>,
}

/// Mock fetcher for testing. Cloning shares routes and the call log.
#[derive(Clone, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<MockState>>,
}

impl MockFetcher {
    /// Creates a new mock fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `response` for `url`.
    pub fn route(&self, url: &str, response: Response) {
        self.state.lock().routes.insert(url.to_string(), response);
    }

    /// Serves a same-origin 200 with the given body for `url`.
    pub fn route_ok(&self, url: &str, body: &str) {
        self.route(
            url,
            Response::new(StatusCode::OK, body.as_bytes(), ResponseType::Basic),
        );
    }

    /// Makes requests to `url` fail as if the network were down.
    pub fn fail(&self, url: &str) {
        self.state.lock().failing.push(url.to_string());
    }

    /// Makes every request fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Number of fetches issued.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Number of fetches issued for `url`.
    pub fn calls_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(_, u)| u == url)
            .count()
    }

    /// `(method, url)` of every fetch, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();
        let mut state = self.state.lock();
        state.calls.push((request.method.to_string(), url.clone()));

        if state.offline || state.failing.contains(&url) {
            return Err(FetchError::Offline);
        }

        Ok(state.routes.get(&url).cloned().unwrap_or_else(|| {
            Response::new(StatusCode::NOT_FOUND, "not found", ResponseType::Basic)
        }))
    }
}

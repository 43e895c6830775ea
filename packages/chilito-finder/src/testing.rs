//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the finder library
//! without making real network calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchRequest, FetchResponse, Fetcher};
use crate::traits::identity::FixedIdentity;

/// One canned reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// 200 with this body
    Page(String),
    /// Arbitrary status with this body
    Status(u16, String),
    /// Transport-level failure
    TransportError,
    /// Request timed out
    Timeout,
}

impl MockReply {
    pub fn page(body: impl Into<String>) -> Self {
        MockReply::Page(body.into())
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Prefix(String),
}

impl Matcher {
    /// Match specificity, or `None` when the URL does not match.
    fn score(&self, url: &str) -> Option<usize> {
        match self {
            Matcher::Exact(u) if u == url => Some(usize::MAX),
            Matcher::Prefix(p) if url.starts_with(p.as_str()) => Some(p.len()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Route {
    matcher: Matcher,
    replies: Vec<MockReply>,
    served: usize,
}

impl Route {
    /// Next reply in the sequence. The last one repeats.
    fn next_reply(&mut self) -> MockReply {
        let index = self.served.min(self.replies.len().saturating_sub(1));
        self.served += 1;
        self.replies
            .get(index)
            .cloned()
            .unwrap_or(MockReply::TransportError)
    }
}

/// A mock fetcher for testing.
///
/// Replies are looked up by exact URL first, then by the longest matching
/// prefix. Unrouted URLs fail at the transport level. Every request is
/// recorded for assertions.
#[derive(Default, Clone)]
pub struct MockFetcher {
    routes: Arc<RwLock<Vec<Route>>>,
    calls: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_route(&self, matcher: Matcher, replies: Vec<MockReply>) {
        self.routes.write().unwrap().push(Route {
            matcher,
            replies,
            served: 0,
        });
    }

    /// Serve a 200 page for this exact URL.
    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        self.with_sequence(url, vec![MockReply::page(body)])
    }

    /// Serve a status and body for this exact URL.
    pub fn with_status(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.with_sequence(url, vec![MockReply::Status(status, body.into())])
    }

    /// Serve replies in order for this exact URL; the last one repeats.
    pub fn with_sequence(self, url: &str, replies: Vec<MockReply>) -> Self {
        self.add_route(Matcher::Exact(url.to_string()), replies);
        self
    }

    /// Serve a 200 page for every URL starting with `prefix`.
    pub fn with_prefix_page(self, prefix: &str, body: impl Into<String>) -> Self {
        self.with_prefix_sequence(prefix, vec![MockReply::page(body)])
    }

    /// Serve replies in order for every URL starting with `prefix`.
    pub fn with_prefix_sequence(self, prefix: &str, replies: Vec<MockReply>) -> Self {
        self.add_route(Matcher::Prefix(prefix.to_string()), replies);
        self
    }

    /// Make this exact URL fail at the transport level.
    pub fn fail_url(self, url: &str) -> Self {
        self.with_sequence(url, vec![MockReply::TransportError])
    }

    /// Make every URL starting with `prefix` fail at the transport level.
    pub fn fail_prefix(self, prefix: &str) -> Self {
        self.with_prefix_sequence(prefix, vec![MockReply::TransportError])
    }

    /// All requests made, in order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Requested URLs, in order.
    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        self.calls.write().unwrap().push(request.clone());

        let reply = {
            let mut routes = self.routes.write().unwrap();
            routes
                .iter_mut()
                .filter_map(|route| route.matcher.score(&request.url).map(|s| (s, route)))
                .max_by_key(|(score, _)| *score)
                .map(|(_, route)| route.next_reply())
        };

        match reply {
            Some(MockReply::Page(body)) => Ok(FetchResponse::ok(&request.url, body)),
            Some(MockReply::Status(status, body)) => {
                Ok(FetchResponse::new(&request.url, status, body))
            }
            Some(MockReply::Timeout) => Err(FetchError::Timeout {
                url: request.url.clone(),
            }),
            Some(MockReply::TransportError) => Err(FetchError::Http(
                format!("mock transport error: {}", request.url).into(),
            )),
            None => Err(FetchError::Http(
                format!("mock: no route for {}", request.url).into(),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Deterministic identity for asserting headers.
pub fn test_identity() -> FixedIdentity {
    FixedIdentity("ChilitoTest/1.0".to_string())
}

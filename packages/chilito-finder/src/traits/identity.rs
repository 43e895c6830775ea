//! Client identity (User-Agent) rotation.
//!
//! Menu pages sit behind bot defenses that correlate repeated requests.
//! Choosing a different browser identity per attempt spreads retries out.
//! This is a rate-limiting workaround, not a security control.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Desktop browser User-Agents used by default.
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Picks the client identity for the next request.
pub trait IdentityRotator: Send + Sync {
    fn next_identity(&self) -> String;
}

/// Uniformly random choice from a pool of User-Agents.
#[derive(Debug, Clone)]
pub struct RandomUserAgents {
    agents: Vec<String>,
}

impl Default for RandomUserAgents {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENTS)
    }
}

impl RandomUserAgents {
    /// Create from a pool. An empty pool falls back to the defaults.
    pub fn new(agents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let agents: Vec<String> = agents.into_iter().map(|a| a.into()).collect();
        if agents.is_empty() {
            return Self::default();
        }
        Self { agents }
    }
}

impl IdentityRotator for RandomUserAgents {
    fn next_identity(&self) -> String {
        self.agents[fastrand::usize(..self.agents.len())].clone()
    }
}

/// Cycles through a pool in order. Deterministic, for tests.
#[derive(Debug)]
pub struct RoundRobinIdentity {
    agents: Vec<String>,
    next: AtomicUsize,
}

impl RoundRobinIdentity {
    pub fn new(agents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut agents: Vec<String> = agents.into_iter().map(|a| a.into()).collect();
        if agents.is_empty() {
            agents = DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect();
        }
        Self {
            agents,
            next: AtomicUsize::new(0),
        }
    }
}

impl IdentityRotator for RoundRobinIdentity {
    fn next_identity(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        self.agents[i % self.agents.len()].clone()
    }
}

/// Always the same identity.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl IdentityRotator for FixedIdentity {
    fn next_identity(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_identity_from_pool() {
        let rotator = RandomUserAgents::new(["a", "b"]);
        for _ in 0..20 {
            let id = rotator.next_identity();
            assert!(id == "a" || id == "b");
        }
    }

    #[test]
    fn test_empty_pool_uses_defaults() {
        let rotator = RandomUserAgents::new(Vec::<String>::new());
        let id = rotator.next_identity();
        assert!(DEFAULT_USER_AGENTS.contains(&id.as_str()));
    }

    #[test]
    fn test_round_robin() {
        let rotator = RoundRobinIdentity::new(["a", "b", "c"]);
        let ids: Vec<_> = (0..4).map(|_| rotator.next_identity()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "a"]);
    }
}

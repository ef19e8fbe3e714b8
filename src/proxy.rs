//! Rotating pool of SOCKS5 egress endpoints.
//!
//! The pool is loaded once at startup from a newline-delimited `host:port`
//! file, shuffled so successive process restarts do not hammer proxies in
//! the same order, and then rotated round-robin. There is no health
//! checking: a dead proxy surfaces as a failed outbound call and the
//! caller's error policy takes over.

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::path::Path;

/// Shared rotation pool. The cursor is owned here and only reachable through
/// [`ProxyPool::next_endpoint`], so concurrent callers can never tear it.
pub struct ProxyPool {
    endpoints: Vec<String>,
    cursor: Mutex<usize>,
}

impl ProxyPool {
    /// Build a pool from a list of `host:port` endpoints, shuffling once.
    pub fn new(mut endpoints: Vec<String>) -> Self {
        endpoints.shuffle(&mut rand::thread_rng());
        Self {
            endpoints,
            cursor: Mutex::new(0),
        }
    }

    /// Load a pool from a proxy list file. Blank lines and `#` comments are
    /// ignored. A missing file yields an empty pool (direct egress).
    pub fn from_file(path: &Path) -> Self {
        let endpoints = match std::fs::read_to_string(path) {
            Ok(content) => parse_proxy_list(&content),
            Err(_) => Vec::new(),
        };

        if endpoints.is_empty() {
            tracing::info!("No proxies loaded, egress is direct");
        } else {
            tracing::info!("Loaded {} SOCKS5 proxies", endpoints.len());
        }

        Self::new(endpoints)
    }

    /// Next endpoint in round-robin order, or `None` when the pool is empty.
    pub fn next_endpoint(&self) -> Option<String> {
        if self.endpoints.is_empty() {
            return None;
        }
        let mut cursor = self.cursor.lock();
        let endpoint = self.endpoints[*cursor].clone();
        *cursor = (*cursor + 1) % self.endpoints.len();
        Some(endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn parse_proxy_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

use std::net::{SocketAddr, ToSocketAddrs};

use log::warn;

const MIN_RETRY_BACKOFF_MS: u64 = 1_000;
const MAX_RETRY_BACKOFF_MS: u64 = 30_000;

/// A configured gossip bootstrap host. Resolution is attempted at
/// `add_entrypoint` time and retried on later cycles with a capped
/// exponential backoff rather than once at startup — a transient DNS
/// failure during a restart storm shouldn't strand the node permanently.
pub struct Entrypoint {
    pub host: String,
    pub port: u16,
    pub resolved: Option<SocketAddr>,
    last_attempt_ms: u64,
    next_backoff_ms: u64,
}

impl Entrypoint {
    pub fn new(host: String, port: u16, now_ms: u64) -> Self {
        let mut entry = Self {
            host,
            port,
            resolved: None,
            last_attempt_ms: 0,
            next_backoff_ms: MIN_RETRY_BACKOFF_MS,
        };
        entry.try_resolve(now_ms);
        entry
    }

    fn due(&self, now_ms: u64) -> bool {
        self.last_attempt_ms == 0
            || now_ms.saturating_sub(self.last_attempt_ms) >= self.next_backoff_ms
    }

    /// Attempts resolution if due; always updates `last_attempt_ms` on a
    /// real attempt so the next cycle's backoff check is accurate.
    pub fn try_resolve(&mut self, now_ms: u64) {
        if self.resolved.is_some() || !self.due(now_ms) {
            return;
        }
        self.last_attempt_ms = now_ms;
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => {
                    self.resolved = Some(addr);
                }
                None => {
                    warn!("gossip entrypoint {} resolved to no addresses", self.host);
                    self.back_off();
                }
            },
            Err(e) => {
                warn!("gossip entrypoint {} dns resolution failed: {e}", self.host);
                self.back_off();
            }
        }
    }

    fn back_off(&mut self) {
        self.next_backoff_ms = (self.next_backoff_ms * 2).min(MAX_RETRY_BACKOFF_MS);
    }

    /// Forces the next `try_resolve` to run a fresh attempt, used when a
    /// previously resolved address starts failing to reach the peer.
    pub fn invalidate(&mut self) {
        self.resolved = None;
        self.next_backoff_ms = MIN_RETRY_BACKOFF_MS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_ipv4_entrypoint_resolves_immediately() {
        let entry = Entrypoint::new("127.0.0.1".to_string(), 8001, 0);
        assert_eq!(entry.resolved, Some("127.0.0.1:8001".parse().unwrap()));
    }

    #[test]
    fn unresolvable_host_backs_off_and_does_not_panic() {
        let mut entry = Entrypoint::new("this-host-does-not-exist.invalid".to_string(), 8001, 0);
        assert!(entry.resolved.is_none());
        entry.try_resolve(500);
        assert!(entry.resolved.is_none());
    }
}

use std::collections::HashMap;

use crate::error::Result;
use crate::keyschedule::{early_data_secret, Secret};

#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub resumption_secret: Secret,
    pub created_at_ms: u64,
    pub lifetime_ms: u64,
}

impl SessionTicket {
    pub fn is_valid(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) < self.lifetime_ms
    }
}

/// Caches resumption tickets by server name for 0-RTT. Early-data bytes
/// written before the server's acceptance/rejection is known are buffered
/// for retransmission if the server rejects early data.
#[derive(Default)]
pub struct TicketCache {
    tickets: HashMap<String, SessionTicket>,
}

impl TicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, server_name: &str, ticket: SessionTicket) {
        self.tickets.insert(server_name.to_string(), ticket);
    }

    pub fn get_valid(&self, server_name: &str, now_ms: u64) -> Option<&SessionTicket> {
        self.tickets
            .get(server_name)
            .filter(|t| t.is_valid(now_ms))
    }

    pub fn remove(&mut self, server_name: &str) {
        self.tickets.remove(server_name);
    }
}

/// Early-data write buffer for a single connection attempt: holds bytes
/// written before the server's EncryptedExtensions confirms or rejects
/// early data, so they can be retransmitted on rejection.
#[derive(Default)]
pub struct EarlyDataBuffer {
    pub early_secret: Option<Secret>,
    buffered: Vec<u8>,
    confirmed: bool,
}

impl EarlyDataBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, ticket: &SessionTicket) -> Result<()> {
        self.early_secret = Some(early_data_secret(&ticket.resumption_secret)?);
        Ok(())
    }

    pub fn buffer_write(&mut self, bytes: &[u8]) {
        if !self.confirmed {
            self.buffered.extend_from_slice(bytes);
        }
    }

    /// Server confirmed early data: the buffer is no longer needed for
    /// retransmission.
    pub fn confirm(&mut self) {
        self.confirmed = true;
        self.buffered.clear();
    }

    /// Server rejected early data: hands back everything buffered so it can
    /// be resent over the 1-RTT channel once it's established.
    pub fn reject(&mut self) -> Vec<u8> {
        self.early_secret = None;
        std::mem::take(&mut self.buffered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_expires_after_lifetime() {
        let ticket = SessionTicket {
            resumption_secret: [0u8; 32],
            created_at_ms: 1000,
            lifetime_ms: 500,
        };
        assert!(ticket.is_valid(1200));
        assert!(!ticket.is_valid(1600));
    }

    #[test]
    fn rejected_early_data_is_returned_for_retransmission() {
        let mut buf = EarlyDataBuffer::new();
        buf.buffer_write(b"hello");
        buf.buffer_write(b" world");
        let bytes = buf.reject();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn confirmed_early_data_clears_buffer() {
        let mut buf = EarlyDataBuffer::new();
        buf.buffer_write(b"hello");
        buf.confirm();
        assert_eq!(buf.reject(), Vec::<u8>::new());
    }
}

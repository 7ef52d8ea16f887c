#[derive(Debug, Clone)]
pub struct QuicConfig {
    pub listen_port: u16,
    pub batch_size: usize,
    /// Lifetime a cached 0-RTT session ticket remains usable, in milliseconds.
    pub session_ticket_lifetime_ms: u64,
    /// Forbids accepting active path migration regardless of what the peer
    /// advertises, for deployments that terminate QUIC behind a fixed LB.
    pub disable_active_migration: bool,
}

impl Default for QuicConfig {
    fn default() -> Self {
        Self {
            listen_port: 8009,
            batch_size: 128,
            session_ticket_lifetime_ms: 7 * 24 * 60 * 60 * 1000,
            disable_active_migration: false,
        }
    }
}

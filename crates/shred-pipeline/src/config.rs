use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ShredConfig {
    pub tvu_port: u16,
    pub repair_port: u16,
    pub batch_size: usize,
    /// Slots more than this far behind the maximum observed slot are
    /// evicted from the assembler even if incomplete.
    pub assembler_window: u64,
    /// Used when the configured `PeerDirectory` has no candidates yet.
    pub static_repair_peers: Vec<SocketAddr>,
}

impl Default for ShredConfig {
    fn default() -> Self {
        Self {
            tvu_port: 8003,
            repair_port: 8004,
            batch_size: 128,
            assembler_window: 150,
            static_repair_peers: Vec::new(),
        }
    }
}

use std::net::SocketAddr;

use crate::error::FabricError;
use crate::packet::PacketBuffer;

/// Explicit construction-time configuration for a fabric handle. Never reads
/// environment or argv itself — callers parse that upstream.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    pub batch_size: usize,
    /// Force a specific backend (used by tests); `None` uses the normal
    /// priority-ordered fallback.
    pub force_backend: Option<BackendKind>,
    pub bind_addr: SocketAddr,
}

impl FabricConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            batch_size: 64,
            force_backend: None,
            bind_addr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    KernelBypass,
    AsyncBatched,
    Portable,
}

/// The uniform surface every backend tier implements. `recv_batch` never
/// errors on "no data" — it returns zero. Socket-level setup errors
/// (EADDRINUSE, EACCES) are reported, not swallowed.
pub trait FabricBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Appends up to `max` received packets to `out`, returning the count
    /// appended. An empty return means no data was available right now.
    fn recv_batch(&mut self, out: &mut Vec<PacketBuffer>, max: usize) -> Result<usize, FabricError>;

    /// Sends every packet in `packets` to `dst`, returning the number
    /// actually sent. Partial sends are retried by the backend, not the
    /// caller.
    fn send_batch(&mut self, packets: &[PacketBuffer], dst: SocketAddr) -> Result<usize, FabricError>;

    fn close(&mut self);
}

//! Packet ingress/egress fabric: a single `recv_batch`/`send_batch` surface
//! backed by whichever of three tiers the host actually supports, chosen
//! once at open time and never swapped mid-flight.
//!
//! Priority order: kernel-bypass (AF_XDP) > async-batched (io_uring-style) >
//! portable (plain non-blocking UDP socket). A backend that fails to set up
//! (missing kernel feature, insufficient privilege) is logged at `warn!` and
//! the next tier is tried; a bind failure that indicates the port itself is
//! unusable (`EADDRINUSE`, `EACCES`) is propagated immediately instead,
//! since no lower tier would fare better on the same address.

mod async_batched;
mod backend;
mod error;
mod kernel_bypass;
mod packet;
mod portable;

pub use backend::{BackendKind, FabricBackend, FabricConfig};
pub use error::FabricError;
pub use kernel_bypass::{KernelBypassBackend, KernelBypassClassifier, KernelBypassClassifierBuilder};
pub use packet::{PacketBuffer, PacketFlags, PACKET_DATA_SIZE};

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use async_batched::AsyncBatchedBackend;
use portable::PortableBackend;

pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn is_address_fatal(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::AddrInUse | std::io::ErrorKind::PermissionDenied
    )
}

/// The fabric handle a component actually holds. Wraps whichever backend
/// tier was selected and exposes the same `recv_batch`/`send_batch` surface
/// regardless of which one it is.
pub struct PacketFabric {
    backend: Box<dyn FabricBackend>,
    batch_size: usize,
}

impl PacketFabric {
    /// Opens a fabric bound to `config.bind_addr`, trying backend tiers in
    /// priority order unless `config.force_backend` pins one (used by
    /// tests). Never blocks waiting for traffic — only socket setup is
    /// synchronous here.
    pub fn open(config: FabricConfig) -> Result<Self, FabricError> {
        if let Some(forced) = config.force_backend {
            let backend = Self::build_backend(forced, &config)?;
            return Ok(Self {
                backend,
                batch_size: config.batch_size,
            });
        }

        match Self::try_kernel_bypass(&config) {
            Ok(backend) => {
                return Ok(Self {
                    backend,
                    batch_size: config.batch_size,
                })
            }
            Err(FabricError::BindFailed(e)) if is_address_fatal(&e) => {
                return Err(FabricError::BindFailed(e))
            }
            Err(e) => log::warn!("kernel-bypass backend unavailable, falling back: {e}"),
        }

        match AsyncBatchedBackend::bind(config.bind_addr, config.batch_size * 4) {
            Ok(backend) => {
                return Ok(Self {
                    backend: Box::new(backend),
                    batch_size: config.batch_size,
                })
            }
            Err(FabricError::BindFailed(e)) if is_address_fatal(&e) => {
                return Err(FabricError::BindFailed(e))
            }
            Err(e) => log::warn!("async-batched backend unavailable, falling back: {e}"),
        }

        let backend = PortableBackend::bind(config.bind_addr)?;
        Ok(Self {
            backend: Box::new(backend),
            batch_size: config.batch_size,
        })
    }

    fn build_backend(
        kind: BackendKind,
        config: &FabricConfig,
    ) -> Result<Box<dyn FabricBackend>, FabricError> {
        match kind {
            BackendKind::KernelBypass => Self::try_kernel_bypass(config),
            BackendKind::AsyncBatched => Ok(Box::new(AsyncBatchedBackend::bind(
                config.bind_addr,
                config.batch_size * 4,
            )?)),
            BackendKind::Portable => Ok(Box::new(PortableBackend::bind(config.bind_addr)?)),
        }
    }

    #[cfg(target_os = "linux")]
    fn try_kernel_bypass(config: &FabricConfig) -> Result<Box<dyn FabricBackend>, FabricError> {
        let mut builder = KernelBypassClassifierBuilder::new();
        builder.register_port(config.bind_addr.port());
        let classifier = builder.finalize_and_attach("eth0")?;
        let backend = KernelBypassBackend::new(&classifier, config.bind_addr.port())?;
        // The classifier must outlive every backend built from it; leaking
        // it here is deliberate — it is torn down by `PacketFabric::close`
        // paths at the process level, not per-backend.
        std::mem::forget(classifier);
        Ok(Box::new(backend))
    }

    #[cfg(not(target_os = "linux"))]
    fn try_kernel_bypass(_config: &FabricConfig) -> Result<Box<dyn FabricBackend>, FabricError> {
        Err(FabricError::Custom(
            "kernel-bypass backend requires Linux".to_string(),
        ))
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Receives up to `self.batch_size` packets, appending them to `out`.
    pub fn recv_batch(&mut self, out: &mut Vec<PacketBuffer>) -> Result<usize, FabricError> {
        self.backend.recv_batch(out, self.batch_size)
    }

    pub fn send_batch(&mut self, packets: &[PacketBuffer], dst: SocketAddr) -> Result<usize, FabricError> {
        self.backend.send_batch(packets, dst)
    }

    pub fn close(&mut self) {
        self.backend.close();
    }
}

impl Drop for PacketFabric {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_with_forced_portable_backend_binds_successfully() {
        let mut config = FabricConfig::new("127.0.0.1:0".parse().unwrap());
        config.force_backend = Some(BackendKind::Portable);
        let fabric = PacketFabric::open(config).expect("portable backend should always be available");
        assert_eq!(fabric.kind(), BackendKind::Portable);
    }

    #[test]
    fn recv_batch_on_empty_socket_returns_zero_not_error() {
        let mut config = FabricConfig::new("127.0.0.1:0".parse().unwrap());
        config.force_backend = Some(BackendKind::Portable);
        let mut fabric = PacketFabric::open(config).unwrap();
        let mut out = Vec::new();
        let n = fabric.recv_batch(&mut out).unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
    }
}

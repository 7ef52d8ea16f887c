use std::collections::HashMap;
use std::net::SocketAddr;

use ed25519_dalek::SigningKey;

use crate::error::Result;
use crate::handshake::{HandshakeState, ServerHandshake};
use crate::keyschedule::Secret;
use crate::loss_detection::LossDetector;
use crate::path::PathTable;
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Initial,
    Handshake,
    Connected,
    Closing,
    Draining,
    Closed,
}

/// Peer-advertised transport parameters this core cares about; real QUIC
/// carries many more, but path migration and flow control are the only
/// behaviors here conditioned on them.
#[derive(Debug, Clone, Copy)]
pub struct TransportParameters {
    pub disable_active_migration: bool,
    pub max_idle_timeout_ms: u64,
    pub initial_max_stream_data: u64,
}

impl Default for TransportParameters {
    fn default() -> Self {
        Self {
            disable_active_migration: false,
            max_idle_timeout_ms: 30_000,
            initial_max_stream_data: 1 << 20,
        }
    }
}

pub struct Connection {
    pub local_connection_id: Vec<u8>,
    pub remote_connection_id: Vec<u8>,
    pub state: ConnectionState,
    pub peer_addr: SocketAddr,
    pub handshake: ServerHandshake,
    pub peer_transport_parameters: TransportParameters,
    pub paths: PathTable,
    pub streams: HashMap<u64, Stream>,
    pub initial_loss: LossDetector,
    pub handshake_loss: LossDetector,
    pub application_loss: LossDetector,
    pub application_secret: Option<Secret>,
}

impl Connection {
    pub fn new(
        local_connection_id: Vec<u8>,
        remote_connection_id: Vec<u8>,
        peer_addr: SocketAddr,
        signing_key: SigningKey,
    ) -> Self {
        Self {
            local_connection_id,
            remote_connection_id,
            state: ConnectionState::Initial,
            peer_addr,
            handshake: ServerHandshake::new(signing_key),
            peer_transport_parameters: TransportParameters::default(),
            paths: PathTable::with_initial_validated_path(peer_addr),
            streams: HashMap::new(),
            initial_loss: LossDetector::new(),
            handshake_loss: LossDetector::new(),
            application_loss: LossDetector::new(),
            application_secret: None,
        }
    }

    pub fn stream_mut(&mut self, id: u64) -> &mut Stream {
        self.streams.entry(id).or_insert_with(|| Stream::new(id))
    }

    pub fn on_handshake_complete(&mut self, application_secret: Secret) {
        self.application_secret = Some(application_secret);
        self.state = ConnectionState::Connected;
    }

    pub fn on_datagram_from(&mut self, from: SocketAddr, now_ms: u64) -> Result<()> {
        let migration_disabled = self.peer_transport_parameters.disable_active_migration;
        self.paths.on_datagram_from(from, now_ms, migration_disabled);
        Ok(())
    }

    pub fn begin_close(&mut self) {
        self.state = ConnectionState::Closing;
    }

    pub fn begin_draining(&mut self) {
        self.state = ConnectionState::Draining;
    }

    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.handshake.state == HandshakeState::Complete
    }
}

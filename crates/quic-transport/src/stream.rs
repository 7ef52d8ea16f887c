use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
    Reset,
}

/// A QUIC stream's receive side reorders bytes by offset; duplicates are
/// discarded and a gap blocks delivery of everything after it until filled,
/// per the ordering guarantee every stream implementation makes.
#[derive(Default)]
struct ReceiveBuffer {
    next_offset: u64,
    pending: BTreeMap<u64, Vec<u8>>,
}

impl ReceiveBuffer {
    fn insert(&mut self, offset: u64, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        let end = offset + data.len() as u64;
        if end <= self.next_offset {
            return;
        }
        self.pending.insert(offset, data);
    }

    fn drain_contiguous(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let Some((&offset, _)) = self.pending.iter().next() else {
                break;
            };
            if offset > self.next_offset {
                break;
            }
            let (_, data) = self.pending.pop_first().unwrap();
            if offset < self.next_offset {
                let skip = (self.next_offset - offset) as usize;
                if skip >= data.len() {
                    continue;
                }
                out.extend_from_slice(&data[skip..]);
                self.next_offset += (data.len() - skip) as u64;
            } else {
                self.next_offset += data.len() as u64;
                out.extend_from_slice(&data);
            }
        }
        out
    }
}

pub struct Stream {
    pub id: u64,
    pub state: StreamState,
    receive: ReceiveBuffer,
    send_offset: u64,
    send_buffer: Vec<u8>,
    pub fin_sent: bool,
    pub fin_received: bool,
}

impl Stream {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: StreamState::Open,
            receive: ReceiveBuffer::default(),
            send_offset: 0,
            send_buffer: Vec::new(),
            fin_sent: false,
            fin_received: false,
        }
    }

    /// Delivers newly received bytes at `offset`, and returns whatever
    /// contiguous prefix is now ready for the application to read.
    pub fn on_data(&mut self, offset: u64, data: &[u8], fin: bool) -> Vec<u8> {
        self.receive.insert(offset, data.to_vec());
        let ready = self.receive.drain_contiguous();
        if fin && offset + data.len() as u64 == self.receive.next_offset {
            self.fin_received = true;
            self.state = match self.state {
                StreamState::Open => StreamState::HalfClosedRemote,
                StreamState::HalfClosedLocal => StreamState::Closed,
                other => other,
            };
        }
        ready
    }

    pub fn queue_send(&mut self, data: &[u8]) -> u64 {
        let offset = self.send_offset;
        self.send_buffer.extend_from_slice(data);
        self.send_offset += data.len() as u64;
        offset
    }

    pub fn close_send(&mut self) {
        self.fin_sent = true;
        self.state = match self.state {
            StreamState::Open => StreamState::HalfClosedLocal,
            StreamState::HalfClosedRemote => StreamState::Closed,
            other => other,
        };
    }

    pub fn reset(&mut self) {
        self.state = StreamState::Reset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_data_blocks_until_gap_fills() {
        let mut s = Stream::new(0);
        let first = s.on_data(5, b"world", false);
        assert!(first.is_empty());
        let second = s.on_data(0, b"hello", false);
        assert_eq!(second, b"helloworld");
    }

    #[test]
    fn duplicate_bytes_are_discarded() {
        let mut s = Stream::new(0);
        s.on_data(0, b"hello", false);
        let repeat = s.on_data(0, b"hello", false);
        assert!(repeat.is_empty());
    }

    #[test]
    fn fin_after_full_delivery_half_closes_remote() {
        let mut s = Stream::new(0);
        s.on_data(0, b"hi", true);
        assert_eq!(s.state, StreamState::HalfClosedRemote);
        assert!(s.fin_received);
    }
}

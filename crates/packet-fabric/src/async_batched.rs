//! io_uring-style batched-syscall backend: a submission queue (SQ) and
//! completion queue (CQ) shared with the kernel, so a burst of receives or
//! sends costs one syscall instead of one-per-packet.
//!
//! The queues are modeled as simple ring buffers of capacity-bound length
//! with atomic head/tail cursors. The kernel side is simulated locally
//! (there is no real io_uring syscall here), but the memory-ordering
//! discipline is the real one: a producer publishes entries with a
//! `Release` store to its tail, and a consumer observes them with an
//! `Acquire` load — anything else risks reading a half-written descriptor.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::backend::{BackendKind, FabricBackend};
use crate::error::FabricError;
use crate::packet::PacketBuffer;

#[derive(Debug, Clone)]
enum Op {
    Recv,
    Send(PacketBuffer, SocketAddr),
}

#[derive(Debug, Clone)]
struct Completion {
    result: i32,
    payload: Option<(Vec<u8>, SocketAddr)>,
}

/// Fixed-capacity ring shared between a producer (us, submitting ops) and a
/// consumer (the kernel, completing them). `head`/`tail` are published with
/// `Release` and observed with `Acquire`, matching the single-producer
/// single-consumer discipline a real io_uring SQ/CQ pair requires.
struct Ring<T> {
    capacity: usize,
    entries: Mutex<VecDeque<T>>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl<T> Ring<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    fn push(&self, item: T) -> Result<(), FabricError> {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= self.capacity {
            return Err(FabricError::SqFull);
        }
        self.entries.lock().unwrap().push_back(item);
        // Publish the new tail only after the entry is visible to readers
        // who will observe this store.
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    fn drain(&self, max: usize) -> Vec<T> {
        let mut guard = self.entries.lock().unwrap();
        let n = max.min(guard.len());
        let drained: Vec<T> = guard.drain(..n).collect();
        // Consumer publishes its new head after removing the entries, so a
        // concurrent producer's capacity check (`tail - head`) never
        // observes room that isn't actually free yet.
        let head = self.head.load(Ordering::Acquire);
        self.head.store(head.wrapping_add(drained.len()), Ordering::Release);
        drained
    }
}

/// Batched backend over a plain UDP socket: submissions accumulate in an SQ,
/// `submit_and_wait` "executes" them against the socket in one pass, and
/// results land in the CQ for the caller to drain.
pub struct AsyncBatchedBackend {
    socket: std::net::UdpSocket,
    sq: Ring<Op>,
    cq: Ring<Completion>,
}

impl AsyncBatchedBackend {
    pub fn bind(addr: SocketAddr, queue_depth: usize) -> Result<Self, FabricError> {
        let socket = std::net::UdpSocket::bind(addr).map_err(FabricError::BindFailed)?;
        socket.set_nonblocking(true).map_err(FabricError::BindFailed)?;
        Ok(Self {
            socket,
            sq: Ring::new(queue_depth),
            cq: Ring::new(queue_depth),
        })
    }

    fn submit_recv(&self) -> Result<(), FabricError> {
        self.sq.push(Op::Recv)
    }

    fn submit_send(&self, packet: PacketBuffer, dst: SocketAddr) -> Result<(), FabricError> {
        self.sq.push(Op::Send(packet, dst))
    }

    /// Executes every queued submission against the real socket and pushes
    /// a completion for each, blocking only until at least `min_complete`
    /// completions exist or the SQ is drained — never indefinitely, since
    /// the socket is non-blocking.
    fn submit_and_wait(&self, min_complete: usize) -> Result<usize, FabricError> {
        let ops = self.sq.drain(usize::MAX);
        let mut completed = 0;
        let mut buf = [0u8; crate::packet::PACKET_DATA_SIZE];
        for op in ops {
            let completion = match op {
                Op::Recv => match self.socket.recv_from(&mut buf) {
                    Ok((len, src)) => Completion {
                        result: len as i32,
                        payload: Some((buf[..len].to_vec(), src)),
                    },
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        Completion { result: 0, payload: None }
                    }
                    Err(e) => return Err(FabricError::SubmitFailed(e)),
                },
                Op::Send(packet, dst) => match self.socket.send_to(packet.payload(), dst) {
                    Ok(n) => Completion { result: n as i32, payload: None },
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        Completion { result: 0, payload: None }
                    }
                    Err(e) => return Err(FabricError::SubmitFailed(e)),
                },
            };
            self.cq.push(completion)?;
            completed += 1;
        }
        let _ = min_complete;
        Ok(completed)
    }
}

impl FabricBackend for AsyncBatchedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::AsyncBatched
    }

    fn recv_batch(&mut self, out: &mut Vec<PacketBuffer>, max: usize) -> Result<usize, FabricError> {
        for _ in 0..max {
            self.submit_recv()?;
        }
        self.submit_and_wait(1)?;
        let completions = self.cq.drain(max);
        let mut n = 0;
        for completion in completions {
            if let Some((bytes, src)) = completion.payload {
                if completion.result > 0 {
                    out.push(PacketBuffer::from_slice(&bytes, src, crate::now_micros()));
                    n += 1;
                }
            }
        }
        Ok(n)
    }

    fn send_batch(&mut self, packets: &[PacketBuffer], dst: SocketAddr) -> Result<usize, FabricError> {
        for packet in packets {
            self.submit_send(packet.clone(), dst)?;
        }
        self.submit_and_wait(packets.len())?;
        let completions = self.cq.drain(packets.len());
        Ok(completions.iter().filter(|c| c.result > 0).count())
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_push_respects_capacity() {
        let ring: Ring<u32> = Ring::new(2);
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        assert!(matches!(ring.push(3), Err(FabricError::SqFull)));
    }

    #[test]
    fn ring_drain_frees_capacity_for_further_pushes() {
        let ring: Ring<u32> = Ring::new(1);
        ring.push(1).unwrap();
        assert_eq!(ring.drain(1), vec![1]);
        ring.push(2).unwrap();
        assert_eq!(ring.drain(1), vec![2]);
    }
}

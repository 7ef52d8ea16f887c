use std::collections::BTreeMap;

pub const MAX_FRAMES_PER_PACKET: usize = 8;
const PACKET_THRESHOLD: u64 = 3;
const TIME_THRESHOLD_NUM: u64 = 9;
const TIME_THRESHOLD_DEN: u64 = 8;
const MIN_TIME_THRESHOLD_MS: u64 = 1;
const MAX_PTO_COUNT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionLevel {
    Initial,
    Handshake,
    Application,
}

#[derive(Debug, Clone)]
pub struct SentPacket {
    pub packet_number: u64,
    pub send_time_ms: u64,
    pub ack_eliciting: bool,
    pub in_flight: bool,
    pub size: usize,
    pub encryption_level: EncryptionLevel,
    pub frame_count: usize,
}

/// RFC 9002 loss detector for one packet-number space. `frame_count` is
/// recorded per sent packet but capped at `MAX_FRAMES_PER_PACKET` by the
/// caller before the packet is handed in; the detector itself does not
/// store frame payloads.
#[derive(Default)]
pub struct LossDetector {
    sent: BTreeMap<u64, SentPacket>,
    largest_acked: Option<u64>,
    smoothed_rtt_ms: u64,
    rttvar_ms: u64,
    min_rtt_ms: u64,
    rtt_initialized: bool,
    pto_count: u32,
}

impl LossDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_packet_sent(&mut self, packet: SentPacket) {
        self.sent.insert(packet.packet_number, packet);
    }

    /// Processes an ACK covering `acked_pns` (assumed sorted ascending),
    /// using `ack_delay_ms` to adjust the RTT sample taken from the
    /// largest newly-acked packet. Returns the packets newly declared lost.
    pub fn on_ack_received(&mut self, acked_pns: &[u64], ack_delay_ms: u64, now_ms: u64) -> Vec<SentPacket> {
        let mut newly_acked = Vec::new();
        for &pn in acked_pns {
            if let Some(p) = self.sent.remove(&pn) {
                newly_acked.push(p);
            }
        }
        if newly_acked.is_empty() {
            return Vec::new();
        }

        let largest = newly_acked.iter().map(|p| p.packet_number).max().unwrap();
        let is_new_largest = self.largest_acked.map(|l| largest > l).unwrap_or(true);
        self.largest_acked = Some(self.largest_acked.map_or(largest, |l| l.max(largest)));

        if is_new_largest {
            if let Some(sample_packet) = newly_acked.iter().find(|p| p.packet_number == largest) {
                let raw_rtt = now_ms.saturating_sub(sample_packet.send_time_ms);
                let adjusted = raw_rtt.saturating_sub(ack_delay_ms);
                let sample = if self.rtt_initialized {
                    adjusted.max(self.min_rtt_ms)
                } else {
                    raw_rtt
                };
                self.update_rtt(raw_rtt, sample);
            }
        }

        self.pto_count = 0;
        self.detect_lost_packets(now_ms)
    }

    fn update_rtt(&mut self, raw_rtt_ms: u64, sample_ms: u64) {
        if !self.rtt_initialized {
            self.rtt_initialized = true;
            self.min_rtt_ms = raw_rtt_ms;
            self.smoothed_rtt_ms = sample_ms;
            self.rttvar_ms = sample_ms / 2;
            return;
        }
        self.min_rtt_ms = self.min_rtt_ms.min(raw_rtt_ms);
        let diff = self.smoothed_rtt_ms.abs_diff(sample_ms);
        self.rttvar_ms = (3 * self.rttvar_ms + diff) / 4;
        self.smoothed_rtt_ms = (7 * self.smoothed_rtt_ms + sample_ms) / 8;
    }

    fn detect_lost_packets(&mut self, now_ms: u64) -> Vec<SentPacket> {
        let largest_acked = match self.largest_acked {
            Some(l) => l,
            None => return Vec::new(),
        };
        let time_threshold_ms = (self.smoothed_rtt_ms * TIME_THRESHOLD_NUM / TIME_THRESHOLD_DEN)
            .max(MIN_TIME_THRESHOLD_MS);

        let lost_pns: Vec<u64> = self
            .sent
            .iter()
            .filter(|(&pn, p)| {
                let by_packet_count = pn + PACKET_THRESHOLD <= largest_acked;
                let by_time = p.send_time_ms + time_threshold_ms <= now_ms;
                by_packet_count || by_time
            })
            .map(|(&pn, _)| pn)
            .collect();

        lost_pns
            .into_iter()
            .filter_map(|pn| self.sent.remove(&pn))
            .collect()
    }

    /// RFC 9002 §6.2.1 PTO computation: `srtt + max(4 * rttvar, 1ms)`,
    /// doubled per consecutive timeout up to a cap.
    pub fn probe_timeout_ms(&self) -> u64 {
        let base = self.smoothed_rtt_ms + (4 * self.rttvar_ms).max(1);
        base << self.pto_count.min(MAX_PTO_COUNT)
    }

    pub fn on_pto_expired(&mut self) {
        self.pto_count = (self.pto_count + 1).min(MAX_PTO_COUNT);
    }

    pub fn smoothed_rtt_ms(&self) -> u64 {
        self.smoothed_rtt_ms
    }

    pub fn in_flight_count(&self) -> usize {
        self.sent.values().filter(|p| p.in_flight).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pn: u64, send_time_ms: u64) -> SentPacket {
        SentPacket {
            packet_number: pn,
            send_time_ms,
            ack_eliciting: true,
            in_flight: true,
            size: 1200,
            encryption_level: EncryptionLevel::Application,
            frame_count: 1,
        }
    }

    #[test]
    fn packet_threshold_declares_older_packets_lost() {
        let mut d = LossDetector::new();
        for pn in 0..5 {
            d.on_packet_sent(packet(pn, 0));
        }
        let lost = d.on_ack_received(&[4], 0, 10);
        let lost_pns: Vec<u64> = lost.iter().map(|p| p.packet_number).collect();
        assert_eq!(lost_pns, vec![0]);
        assert_eq!(d.in_flight_count(), 3);
    }

    #[test]
    fn rtt_updates_on_first_sample() {
        let mut d = LossDetector::new();
        d.on_packet_sent(packet(0, 100));
        d.on_ack_received(&[0], 0, 150);
        assert_eq!(d.smoothed_rtt_ms(), 50);
    }

    #[test]
    fn pto_doubles_with_each_expiry() {
        let mut d = LossDetector::new();
        d.on_packet_sent(packet(0, 0));
        d.on_ack_received(&[0], 0, 100);
        let first = d.probe_timeout_ms();
        d.on_pto_expired();
        let second = d.probe_timeout_ms();
        assert_eq!(second, first * 2);
    }
}

#[derive(Debug, Clone)]
pub struct TxConfig {
    pub tpu_port: u16,
    pub tpu_forwards_port: u16,
    pub batch_size: usize,
    /// Maximum number of admitted transactions held for banking-stage
    /// consumption at once.
    pub queue_capacity: usize,
    /// Maximum number of first-signatures tracked for duplicate rejection.
    pub dedup_capacity: usize,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            tpu_port: 8005,
            tpu_forwards_port: 8006,
            batch_size: 128,
            queue_capacity: 100_000,
            dedup_capacity: 200_000,
        }
    }
}

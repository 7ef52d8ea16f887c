use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Validator network I/O core: gossip, shreds, transactions, and QUIC transport")]
pub struct Args {
    /// Path to an ed25519 identity keypair file (64-byte raw secret+public, hex-encoded).
    #[arg(long, env, default_value = "./identity.key")]
    pub identity_keypair: PathBuf,

    /// Public IP address to advertise in gossip contact info.
    #[arg(long, env)]
    pub advertise_ip: IpAddr,

    /// Gossip entrypoints in the form of HOST:PORT. Accepts multiple.
    #[arg(long, env, value_delimiter = ',')]
    pub entrypoints: Vec<String>,

    /// Shred version this validator expects from its cluster.
    #[arg(long, env, default_value_t = 0)]
    pub shred_version: u16,

    #[arg(long, env, default_value_t = 8001)]
    pub gossip_port: u16,

    #[arg(long, env, default_value_t = 8003)]
    pub tvu_port: u16,

    #[arg(long, env, default_value_t = 8004)]
    pub repair_port: u16,

    #[arg(long, env, default_value_t = 8005)]
    pub tpu_port: u16,

    #[arg(long, env, default_value_t = 8006)]
    pub tpu_forwards_port: u16,

    #[arg(long, env, default_value_t = 8009)]
    pub quic_port: u16,
}

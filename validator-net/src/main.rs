mod args;

use std::thread;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use ed25519_dalek::SigningKey;
use log::info;

use gossip_engine::GossipConfig;
use quic_transport::QuicConfig;
use shred_pipeline::ShredConfig;
use tx_pipeline::TxConfig;
use validator_net_core::{ValidatorNet, ValidatorNetConfig};

use args::Args;

fn load_identity(path: &std::path::Path) -> SigningKey {
    let contents = std::fs::read_to_string(path).expect("failed to read identity keypair file");
    let bytes = hex::decode(contents.trim()).expect("identity keypair file is not valid hex");
    let secret: [u8; 32] = bytes[..32]
        .try_into()
        .expect("identity keypair file must contain at least 32 bytes");
    SigningKey::from_bytes(&secret)
}

fn parse_entrypoint(raw: &str) -> (String, u16) {
    match raw.rsplit_once(':') {
        Some((host, port)) => (
            host.to_string(),
            port.parse().expect("entrypoint port must be numeric"),
        ),
        None => (raw.to_string(), 8001),
    }
}

fn main() {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("validator-net starting, advertising {}", args.advertise_ip);

    let identity = load_identity(&args.identity_keypair);

    let config = ValidatorNetConfig {
        identity,
        shred_version: args.shred_version,
        gossip: GossipConfig {
            bind_port: args.gossip_port,
            ..GossipConfig::default()
        },
        shred: ShredConfig {
            tvu_port: args.tvu_port,
            repair_port: args.repair_port,
            ..ShredConfig::default()
        },
        tx: TxConfig {
            tpu_port: args.tpu_port,
            tpu_forwards_port: args.tpu_forwards_port,
            ..TxConfig::default()
        },
        quic: QuicConfig {
            listen_port: args.quic_port,
            ..QuicConfig::default()
        },
    };

    let mut net = ValidatorNet::start(config, args.advertise_ip).expect("failed to start validator network core");

    for raw in &args.entrypoints {
        let (host, port) = parse_entrypoint(raw);
        net.gossip.add_entrypoint(host, port);
    }

    net.spawn_threads();

    info!("validator-net running; components: gossip, shreds, transactions, quic");

    loop {
        thread::sleep(Duration::from_secs(60));
        let gossip_stats = net.gossip.get_stats();
        let shred_stats = net.shreds.get_stats();
        let tx_stats = net.transactions.get_stats();
        let quic_stats = net.quic.get_stats();
        info!(
            "peers={} shreds_inserted={} tx_admitted={} quic_active={}",
            net.gossip.peer_count(),
            shred_stats.shreds_inserted,
            tx_stats.transactions_admitted,
            quic_stats.connections_active,
        );
        let _ = gossip_stats;
    }
}

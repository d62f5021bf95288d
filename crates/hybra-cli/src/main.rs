#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::KernelArgs;
use hybra_core::{FixedClock, SystemClock};

/// Tool configuration resolved from CLI/env/defaults.
#[derive(Parser, Debug)]
#[command(name = "hybra", version, about = "Inspect Hybra difficulty, proof-of-work and stake kernels")]
struct Cli {
    /// Network preset: mainnet, testnet or regtest [env: HYBRA_NETWORK]
    #[arg(long, global = true)]
    network: Option<String>,
    /// JSON file whose keys override the preset's chain parameters
    #[arg(long, global = true)]
    params: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode compact bits, reporting sign and overflow flags
    DecodeBits {
        /// Compact bits, hex (0x...) or decimal
        bits: String,
    },
    /// Encode a target (display hex) as compact bits
    EncodeTarget {
        /// 256-bit target, big-endian hex
        target: String,
    },
    /// Check a header hash against compact bits and the network limit
    CheckPow {
        /// Header hash, display hex
        hash: String,
        /// Compact bits
        bits: String,
    },
    /// Compute a stake kernel hash, optionally checking it against a target
    KernelHash {
        /// Stake modifier of the previous block
        #[arg(long)]
        modifier: String,
        /// Time of the block that confirmed the staked output
        #[arg(long)]
        block_from_time: u32,
        /// Txid of the staked output
        #[arg(long)]
        txid: String,
        /// Output index of the staked output
        #[arg(long, default_value_t = 0)]
        vout: u32,
        /// Candidate timestamp
        #[arg(long)]
        time: u32,
        /// Compact bits to check the kernel against
        #[arg(long)]
        bits: Option<String>,
        /// Staked amount in atoms (default 1)
        #[arg(long)]
        amount: Option<u64>,
    },
    /// Required bits for the block after a chain fixture's tip
    NextTarget {
        /// JSON array of block index entries, genesis first
        #[arg(long)]
        chain: PathBuf,
        /// Proof kind of the next block: work or stake
        #[arg(long, default_value = "work")]
        kind: String,
    },
    /// Check a proof-of-stake block time against alignment and future drift
    StakeTime {
        /// Candidate block time (Unix seconds)
        time: u32,
        /// Adjusted time to check against; the system clock when omitted
        #[arg(long)]
        now: Option<i64>,
    },
    /// Print the resolved chain parameters as JSON
    Params,
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HYBRA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<String, String> {
    let params = config::resolve_params(cli.network, cli.params.as_deref())?;
    tracing::debug!(network = %params.network, "parameters resolved");

    match cli.command {
        Command::DecodeBits { bits } => commands::decode_bits(&bits),
        Command::EncodeTarget { target } => commands::encode_target(&target),
        Command::CheckPow { hash, bits } => commands::check_pow(&hash, &bits, &params),
        Command::KernelHash {
            modifier,
            block_from_time,
            txid,
            vout,
            time,
            bits,
            amount,
        } => commands::kernel(&KernelArgs {
            modifier: &modifier,
            block_from_time,
            txid: &txid,
            vout,
            time,
            bits: bits.as_deref(),
            amount,
        }),
        Command::NextTarget { chain, kind } => {
            let kind = commands::parse_kind(&kind)?;
            let index = commands::load_chain(&chain)?;
            commands::next_target(&index, kind, &params)
        }
        Command::StakeTime { time, now } => match now {
            Some(now) => commands::stake_time(time, &FixedClock(now), &params),
            None => commands::stake_time(time, &SystemClock, &params),
        },
        Command::Params => serde_json::to_string_pretty(&params).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_network_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["hybra", "decode-bits", "0x1d00ffff", "--network", "regtest"])
            .expect("parse");
        assert_eq!(cli.network.as_deref(), Some("regtest"));
        assert!(matches!(cli.command, Command::DecodeBits { .. }));
    }

    #[test]
    fn params_command_prints_preset() {
        let cli = Cli::try_parse_from(["hybra", "--network", "regtest", "params"]).expect("parse");
        let out = run(cli).expect("run");
        let parsed: hybra_core::ChainParams = serde_json::from_str(&out).expect("json");
        assert_eq!(parsed, hybra_core::ChainParams::regtest());
    }

    #[test]
    fn stake_time_uses_system_clock_by_default() {
        // Genesis-era timestamp: aligned and never in the future of the wall clock.
        let cli = Cli::try_parse_from(["hybra", "stake-time", "1407053632"]).expect("parse");
        assert!(matches!(cli.command, Command::StakeTime { now: None, .. }));
        let out = run(cli).expect("run");
        assert!(out.starts_with("ok: 1407053632"));

        let cli = Cli::try_parse_from(["hybra", "stake-time", "1407053632", "--now", "1407000000"])
            .expect("parse");
        let err = run(cli).expect_err("future");
        assert!(err.contains("future"));
    }

    #[test]
    fn check_pow_reports_failure() {
        let cli = Cli::try_parse_from([
            "hybra",
            "--network",
            "regtest",
            "check-pow",
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            "0x207fffff",
        ])
        .expect("parse");
        let err = run(cli).expect_err("insufficient work");
        assert!(err.contains("insufficient proof of work"));
    }
}

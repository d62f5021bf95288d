//! Subcommand implementations. Each returns the text to print.

use std::fs;
use std::path::Path;

use hybra_chain::ChainIndex;
use hybra_consensus::{
    bits_to_target, check_proof_of_work, check_stake_block_timestamp, check_stake_kernel_hash,
    decode_compact, kernel_hash, next_target_required, target_to_bits, target_to_hash,
};
use hybra_core::{
    AdjustedTime, Amount, BlockIndex, ChainParams, ChainView, Hash32, OutPoint, ProofKind,
};
use tracing::debug;

/// Parse compact bits given as `0x`-prefixed hex or decimal.
pub fn parse_bits(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid bits '{s}': {e}"))
}

fn parse_hash(s: &str) -> Result<Hash32, String> {
    s.parse().map_err(|e| format!("invalid hash '{s}': {e}"))
}

/// Parse a proof kind name.
pub fn parse_kind(s: &str) -> Result<ProofKind, String> {
    match s {
        "work" | "pow" => Ok(ProofKind::Work),
        "stake" | "pos" => Ok(ProofKind::Stake),
        other => Err(format!("unknown proof kind '{other}'")),
    }
}

fn display_target(bits: u32) -> Result<String, String> {
    let target = decode_compact(bits).target;
    target_to_hash(&target)
        .map(|h| h.to_string())
        .ok_or_else(|| "target does not fit 256 bits".to_string())
}

pub fn decode_bits(bits: &str) -> Result<String, String> {
    let bits = parse_bits(bits)?;
    let decoded = decode_compact(bits);
    let mut out = format!(
        "bits:     {bits:#010x}\ntarget:   {}\nnegative: {}\noverflow: {}",
        display_target(bits)?,
        decoded.negative,
        decoded.overflow
    );
    match bits_to_target(bits).and_then(|t| target_to_bits(&t)) {
        Ok(normalized) => out.push_str(&format!("\nnormalized: {normalized:#010x}")),
        Err(e) => out.push_str(&format!("\nunusable: {e}")),
    }
    Ok(out)
}

pub fn encode_target(target: &str) -> Result<String, String> {
    let hash = parse_hash(target)?;
    let bits = target_to_bits(&hybra_consensus::hash_to_target(&hash)).map_err(|e| e.to_string())?;
    Ok(format!("{bits:#010x}"))
}

pub fn check_pow(hash: &str, bits: &str, params: &ChainParams) -> Result<String, String> {
    let hash = parse_hash(hash)?;
    let bits = parse_bits(bits)?;
    check_proof_of_work(&hash, bits, &params.pow_limit).map_err(|e| e.to_string())?;
    Ok(format!("ok: {hash} meets {bits:#010x}"))
}

/// Inputs of the `kernel-hash` subcommand.
pub struct KernelArgs<'a> {
    pub modifier: &'a str,
    pub block_from_time: u32,
    pub txid: &'a str,
    pub vout: u32,
    pub time: u32,
    pub bits: Option<&'a str>,
    pub amount: Option<u64>,
}

pub fn kernel(args: &KernelArgs<'_>) -> Result<String, String> {
    let modifier = parse_hash(args.modifier)?;
    let prevout = OutPoint::new(parse_hash(args.txid)?, args.vout);
    let hash = kernel_hash(&modifier, args.block_from_time, &prevout, args.time);
    let mut out = format!("kernel: {hash}");

    if let Some(bits) = args.bits {
        let bits = parse_bits(bits)?;
        let amount = Amount::from_atoms(args.amount.unwrap_or(1));
        // Only the stored modifier of the previous block is read.
        let prev = BlockIndex {
            hash: Hash32::zero(),
            height: 0,
            time: 0,
            bits,
            proof: ProofKind::Stake,
            stake_modifier: modifier,
        };
        match check_stake_kernel_hash(&prev, bits, args.block_from_time, amount, &prevout, args.time) {
            Ok(_) => out.push_str(&format!("\nmeets {bits:#010x} weighted by {amount}")),
            Err(e) => out.push_str(&format!("\nrejected: {e}")),
        }
    }
    Ok(out)
}

/// Check a proof-of-stake block time against alignment and the clock's drift bound.
pub fn stake_time<T: AdjustedTime + ?Sized>(
    time: u32,
    clock: &T,
    params: &ChainParams,
) -> Result<String, String> {
    let now = clock.adjusted_time();
    check_stake_block_timestamp(time, now, params).map_err(|e| e.to_string())?;
    Ok(format!(
        "ok: {time} is aligned and within drift of {now} (latest {})",
        params.future_drift(now)
    ))
}

/// Load a chain fixture: a JSON array of block index entries, genesis first.
pub fn load_chain(path: &Path) -> Result<ChainIndex, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let entries: Vec<BlockIndex> =
        serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))?;
    debug!(blocks = entries.len(), path = %path.display(), "chain fixture loaded");
    ChainIndex::from_entries(entries).map_err(|e| e.to_string())
}

pub fn next_target(chain: &ChainIndex, kind: ProofKind, params: &ChainParams) -> Result<String, String> {
    let tip = chain.tip();
    let bits = next_target_required(chain, tip, kind, params).map_err(|e| e.to_string())?;
    let height = tip.map(|t| t.height + 1).unwrap_or(0);
    let last_same_kind = tip
        .and_then(|t| chain.last_block_of_kind(t, kind))
        .map(|b| b.height.to_string())
        .unwrap_or_else(|| "-".into());
    Ok(format!(
        "height:   {height}\nkind:     {kind:?}\nbits:     {bits:#010x}\ntarget:   {}\nretarget from height {last_same_kind}",
        display_target(bits)?
    ))
}

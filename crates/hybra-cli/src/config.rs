//! Parameter resolution from CLI, environment and defaults.

use std::env;
use std::fs;
use std::path::Path;

use hybra_core::ChainParams;
use serde_json::Value;

const DEFAULT_NETWORK: &str = "mainnet";

/// Resolve chain parameters.
///
/// The preset comes from `--network`, then `HYBRA_NETWORK`, then mainnet.
/// Keys present in the `--params` JSON file replace the preset's values.
pub fn resolve_params(
    network: Option<String>,
    params_file: Option<&Path>,
) -> Result<ChainParams, String> {
    let network = network
        .or_else(|| env::var("HYBRA_NETWORK").ok())
        .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
    let preset =
        ChainParams::by_name(&network).ok_or_else(|| format!("unknown network '{network}'"))?;

    let Some(path) = params_file else {
        return Ok(preset);
    };

    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let overrides: Value =
        serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))?;
    let Value::Object(overrides) = overrides else {
        return Err(format!("{}: expected a JSON object", path.display()));
    };

    let mut merged = serde_json::to_value(&preset).map_err(|e| e.to_string())?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in overrides {
            if !fields.contains_key(&key) {
                return Err(format!("{}: unknown parameter '{key}'", path.display()));
            }
            fields.insert(key, value);
        }
    }
    let params: ChainParams =
        serde_json::from_value(merged).map_err(|e| format!("{}: {e}", path.display()))?;
    params
        .validate()
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_params(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn preset_by_flag() {
        let p = resolve_params(Some("regtest".into()), None).expect("regtest");
        assert_eq!(p, ChainParams::regtest());
    }

    #[test]
    fn unusable_override_values_rejected() {
        let file = write_params(r#"{ "stake_timestamp_mask": 4294967295 }"#);
        let err = resolve_params(Some("regtest".into()), Some(file.path())).expect_err("mask");
        assert!(err.contains("stake timestamp mask"));

        let file = write_params(r#"{ "target_spacing": 9223372036854775807 }"#);
        let err = resolve_params(Some("regtest".into()), Some(file.path())).expect_err("spacing");
        assert!(err.contains("timespan"));
    }

    #[test]
    fn unknown_network_rejected() {
        let err = resolve_params(Some("moonnet".into()), None).expect_err("unknown");
        assert!(err.contains("moonnet"));
    }

    #[test]
    fn file_overrides_preset_fields() {
        let file = write_params(r#"{ "stake_min_confirmations": 3, "max_future_drift": 30 }"#);
        let p = resolve_params(Some("testnet".into()), Some(file.path())).expect("params");
        assert_eq!(p.stake_min_confirmations, 3);
        assert_eq!(p.max_future_drift, 30);
        assert_eq!(p.pow_limit, ChainParams::testnet().pow_limit);
    }

    #[test]
    fn limits_parse_from_display_hex() {
        let file = write_params(
            r#"{ "pow_limit": "00000000ffff0000000000000000000000000000000000000000000000000000" }"#,
        );
        let p = resolve_params(Some("mainnet".into()), Some(file.path())).expect("params");
        assert!(p.pow_limit.to_string().starts_with("00000000ffff"));
    }

    #[test]
    fn unknown_keys_and_bad_json_rejected() {
        let file = write_params(r#"{ "stake_min_confirmation": 3 }"#);
        let err = resolve_params(Some("mainnet".into()), Some(file.path())).expect_err("typo");
        assert!(err.contains("stake_min_confirmation"));

        let file = write_params("not json");
        assert!(resolve_params(Some("mainnet".into()), Some(file.path())).is_err());

        let file = write_params("[1, 2]");
        assert!(resolve_params(Some("mainnet".into()), Some(file.path())).is_err());
    }

    #[test]
    fn missing_file_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        assert!(resolve_params(Some("mainnet".into()), Some(&path)).is_err());
    }
}

use anyhow::{Context, Result};
use heatmap_core::HeatmapResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `result` as pretty JSON. The file is written next to its target
/// and renamed into place, so readers never see a partial document.
pub fn write_atomic(result: &HeatmapResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(result)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to move output into {}", path.display()));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "heatmap.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use heatmap_core::{SectorGroup, TickerSnapshot};
    use rust_decimal_macros::dec;

    fn sample() -> HeatmapResult {
        HeatmapResult {
            sectors: vec![SectorGroup {
                name: "Technology".to_string(),
                stocks: vec![TickerSnapshot {
                    ticker: "AAPL".to_string(),
                    price: dec!(190.5),
                    change_pct: dec!(1.25),
                    market_cap: dec!(3000000000000),
                    pe_ratio: Some(dec!(30.1)),
                    forward_pe_ratio: None,
                }],
            }],
            generated_at: Utc::now(),
            ticker_count: 1,
        }
    }

    #[test]
    fn test_writes_document_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static/data/heatmap.json");

        write_atomic(&sample(), &path).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["sectors"][0]["stocks"][0]["ticker"], "AAPL");
        assert!(body.contains('\n'));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.json");
        fs::write(&path, "stale").unwrap();

        write_atomic(&HeatmapResult::empty(Utc::now()), &path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json["sectors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("out/heatmap.json");
        assert_eq!(temp_path(path), PathBuf::from("out/heatmap.json.tmp"));
    }
}

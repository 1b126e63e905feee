//! Sample files written on first run so the tools work out of the box.

use crate::utils::error::Result;
use std::fs;
use std::path::Path;

pub const SAMPLE_EVENTS_CSV: &str = "event_type,severity,vuln_count,asset_criticality,asset_id
malware,7,3,8,asset_001
phishing,5,1,6,asset_002
dos,3,0,5,asset_003
ransomware,9,4,9,asset_004
malware,6,2,7,asset_005
";

pub const SAMPLE_CONFIG_YAML: &str = "threshold: 0.5
playbook:
  malware:
  - Run antivirus scan
  - Isolate infected machine
  - Update malware signatures
  phishing:
  - Reset user passwords
  - Block phishing domains
  - Conduct user training
";

/// 只在檔案不存在時寫入；回傳是否有寫入
fn write_if_missing(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(true)
}

pub fn ensure_sample_config(path: &Path) -> Result<bool> {
    write_if_missing(path, SAMPLE_CONFIG_YAML)
}

pub fn ensure_sample_events(path: &Path) -> Result<bool> {
    let written = write_if_missing(path, SAMPLE_EVENTS_CSV)?;
    if written {
        tracing::info!("📝 Wrote sample events to {}", path.display());
    }
    Ok(written)
}

//! Out-of-process media probing via `ffprobe`.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format` and maps
//! the `format` section into [`ProbeInfo`]. Missing fields and the `"N/A"`
//! sentinel degrade to `None`; a failed probe never fails a browse.

use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

const FFPROBE_BIN: &str = "ffprobe";

/// Bitrate and duration of a media file, as far as the probe could tell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeInfo {
    /// Container bitrate in bits per second.
    pub bitrate: Option<u64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to run {FFPROBE_BIN}: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("{FFPROBE_BIN} exited with {0}")]
    Status(std::process::ExitStatus),
    #[error("unparseable {FFPROBE_BIN} output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    bit_rate: Option<String>,
    duration: Option<String>,
}

pub async fn probe(path: &Path) -> Result<ProbeInfo, ProbeError> {
    let output = Command::new(FFPROBE_BIN)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await?;
    if !output.status.success() {
        return Err(ProbeError::Status(output.status));
    }
    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    Ok(ProbeInfo {
        bitrate: numeric_field(parsed.format.bit_rate),
        duration: numeric_field(parsed.format.duration),
    })
}

fn numeric_field<T: std::str::FromStr>(field: Option<String>) -> Option<T> {
    let field = field?;
    if field == "N/A" {
        return None;
    }
    field.parse().ok()
}

//! Media duration probing via ffprobe
//!
//! The core never computes media durations itself — it consumes the
//! number an external probe reports. Callers fall back to
//! [`crate::edits::DEFAULT_DURATION_SECONDS`] when probing fails, so a
//! missing ffprobe degrades the result instead of aborting the command.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe the duration of a media file, in seconds.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| Error::Probe(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(Error::Probe(format!(
            "ffprobe exited with {} for {}",
            output.status,
            path.display()
        )));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::Probe(format!("unreadable ffprobe output: {e}")))?;
    let duration = parsed
        .format
        .duration
        .ok_or_else(|| Error::Probe(format!("no duration reported for {}", path.display())))?;
    let seconds: f64 = duration
        .parse()
        .map_err(|_| Error::Probe(format!("unreadable duration value: {duration}")))?;

    debug!(path = %path.display(), seconds, "probed media duration");
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_file_is_probe_error() {
        // Either ffprobe is absent or it fails on the path; both must
        // surface as a probe error the caller can fall back from.
        let err = probe_duration(Path::new("/nonexistent/clip.mov")).unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }

    #[test]
    fn test_probe_output_parsing() {
        let parsed: ProbeOutput =
            serde_json::from_str(r#"{"format": {"duration": "10.000000"}}"#).unwrap();
        assert_eq!(parsed.format.duration.as_deref(), Some("10.000000"));

        let parsed: ProbeOutput = serde_json::from_str(r#"{"format": {}}"#).unwrap();
        assert!(parsed.format.duration.is_none());
    }
}

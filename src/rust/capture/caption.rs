//! SubRip caption written next to each recording so players overlay the
//! wall-clock start time.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::ArtifactError;

pub fn caption_text(started_at: &DateTime<Local>, duration: Duration) -> String {
    format!(
        "1\n00:00:00,000 --> {}\n{}\n",
        srt_timestamp(duration),
        started_at.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn write_caption(
    path: &Path,
    started_at: &DateTime<Local>,
    duration: Duration,
) -> Result<(), ArtifactError> {
    fs::write(path, caption_text(started_at, duration)).map_err(|source| ArtifactError {
        path: path.to_path_buf(),
        source,
    })
}

fn srt_timestamp(d: Duration) -> String {
    let ms = d.as_millis();
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn one_minute_entry() {
        let started_at = Local.with_ymd_and_hms(2023, 2, 14, 21, 7, 30).unwrap();
        assert_eq!(
            caption_text(&started_at, Duration::from_secs(60)),
            "1\n00:00:00,000 --> 00:01:00,000\n2023-02-14 21:07:30\n"
        );
    }

    #[test]
    fn timestamps() {
        assert_eq!(srt_timestamp(Duration::from_millis(3_723_004)), "01:02:03,004");
        assert_eq!(srt_timestamp(Duration::ZERO), "00:00:00,000");
    }

    #[test]
    fn write_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("x.srt");
        let err = write_caption(&path, &Local::now(), Duration::from_secs(60)).unwrap_err();
        assert_eq!(err.path, path);
    }
}

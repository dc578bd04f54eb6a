//! Timestamp formatting for the video timeline.
//!
//! Provides plain `HH:MM:SS[.mmm]` formatting for logs and the
//! comma-millisecond `HH:MM:SS,mmm` form SRT requires.

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    // Include milliseconds if present
    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
pub fn srt_timestamp(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let total_ms = (total_secs * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds_whole() {
        assert_eq!(format_seconds(5400.0), "01:30:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(0.0), "00:00:00");
    }

    #[test]
    fn test_format_seconds_fractional() {
        assert_eq!(format_seconds(90.5), "00:01:30.500");
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(srt_timestamp(5.25), "00:00:05,250");
        assert_eq!(srt_timestamp(3661.007), "01:01:01,007");
    }

    #[test]
    fn test_negative_clamped() {
        assert_eq!(srt_timestamp(-1.0), "00:00:00,000");
    }
}

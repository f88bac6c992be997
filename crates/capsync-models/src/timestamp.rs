//! Timestamp formatting utilities.

/// Format seconds into `HH:MM:SS` or `HH:MM:SS.mmm`.
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

/// Format seconds as a compact player clock: `m:ss`.
pub fn format_clock(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let minutes = (total_secs / 60.0).floor() as u64;
    let seconds = (total_secs % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(1.5), "00:00:01.500");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(5.9), "0:05");
        assert_eq!(format_clock(75.2), "1:15");
        assert_eq!(format_clock(3600.0), "60:00");
        assert_eq!(format_clock(-3.0), "0:00");
    }
}

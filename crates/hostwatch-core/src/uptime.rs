//! Uptime formatting.

/// Formats an elapsed duration in seconds as `"{d}d {h}h {m}m"`.
///
/// Greedy decomposition into days, hours and minutes; seconds are
/// discarded.
pub fn format_uptime(elapsed_secs: u64) -> String {
    let days = elapsed_secs / 86_400;
    let hours = (elapsed_secs % 86_400) / 3_600;
    let minutes = (elapsed_secs % 3_600) / 60;
    format!("{days}d {hours}h {minutes}m")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_uptime() {
        assert_eq!(format_uptime(0), "0d 0h 0m");
    }

    #[test]
    fn test_sub_minute_uptime() {
        assert_eq!(format_uptime(59), "0d 0h 0m");
    }

    #[test]
    fn test_one_of_each_unit() {
        assert_eq!(format_uptime(86_400 + 3_600 + 60 + 1), "1d 1h 1m");
    }

    #[test]
    fn test_long_uptime() {
        assert_eq!(format_uptime(400 * 86_400 + 23 * 3_600 + 59 * 60), "400d 23h 59m");
    }

    #[test]
    fn test_format_pattern_holds() {
        // "{integer}d {integer}h {integer}m" for arbitrary durations.
        for secs in [0, 1, 61, 3_599, 3_601, 90_061, u64::from(u32::MAX)] {
            let formatted = format_uptime(secs);
            let mut parts = formatted.split(' ');
            let day = parts.next().unwrap();
            let hour = parts.next().unwrap();
            let minute = parts.next().unwrap();
            assert!(parts.next().is_none());
            assert!(day.strip_suffix('d').unwrap().parse::<u64>().is_ok());
            assert!(hour.strip_suffix('h').unwrap().parse::<u64>().is_ok());
            assert!(minute.strip_suffix('m').unwrap().parse::<u64>().is_ok());
        }
    }
}

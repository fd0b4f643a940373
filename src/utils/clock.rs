/// Renders remaining seconds as `mm:ss`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(600), "10:00");
        assert_eq!(format_countdown(179), "02:59");
        assert_eq!(format_countdown(0), "00:00");
    }
}

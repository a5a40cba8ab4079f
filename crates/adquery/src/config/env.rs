#[must_use]
pub(super) fn read_raw_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[must_use]
pub(super) fn parse_non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn parse_usize(raw: Option<&str>, default_value: usize, min_value: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
pub(super) fn parse_u64(raw: Option<&str>, default_value: u64, min_value: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
pub(super) fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items = raw?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use super::{parse_list, parse_non_empty, parse_u64, parse_usize};

    #[test]
    fn usize_parser_falls_back_below_minimum() {
        assert_eq!(parse_usize(Some("0"), 10, 1), 10);
        assert_eq!(parse_usize(Some(" 25 "), 10, 1), 25);
        assert_eq!(parse_usize(Some("many"), 10, 1), 10);
        assert_eq!(parse_usize(None, 10, 1), 10);
    }

    #[test]
    fn u64_parser_accepts_zero_when_allowed() {
        assert_eq!(parse_u64(Some("0"), 24, 0), 0);
        assert_eq!(parse_u64(Some("-3"), 24, 0), 24);
    }

    #[test]
    fn list_parser_drops_blank_items() {
        assert_eq!(
            parse_list(Some("a, ,b,")),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(parse_list(Some(" , ")), None);
        assert_eq!(parse_non_empty(Some("   ")), None);
    }
}

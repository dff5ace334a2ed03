use chrono::{DateTime, Datelike, FixedOffset};

/// Day key used when a commit carries no parseable date.
pub const UNKNOWN_DAY: &str = "0001-01-01 00:00:00 +0000 UTC";

/// Truncates a commit date to midnight of its calendar day and renders it in
/// the fixed `YYYY-MM-DD 00:00:00 +0000 UTC` form.
///
/// The calendar day is the one in the author's own offset; the result is
/// labelled UTC. Keys sort lexically in chronological order.
pub fn day_key(date: Option<&DateTime<FixedOffset>>) -> String {
    match date {
        Some(d) => format!(
            "{:04}-{:02}-{:02} 00:00:00 +0000 UTC",
            d.year(),
            d.month(),
            d.day()
        ),
        None => UNKNOWN_DAY.to_string(),
    }
}

/// Appends `value` unless it is already present. Returns whether it was added.
pub fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

/// Removes duplicates, keeping the first occurrence of each value.
pub fn dedup_preserving_order(values: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        push_unique(&mut out, v);
    }
    out
}

/// Drops every `../` marker from an extracted import path.
pub fn strip_relative_markers(identifier: &str) -> String {
    identifier.replace("../", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn day_key_truncates_to_midnight() {
        let a = DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z").unwrap();
        let b = DateTime::parse_from_rfc3339("2024-01-01T23:00:00Z").unwrap();
        let c = DateTime::parse_from_rfc3339("2024-01-02T00:01:00Z").unwrap();
        assert_eq!(day_key(Some(&a)), "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(day_key(Some(&a)), day_key(Some(&b)));
        assert_eq!(day_key(Some(&c)), "2024-01-02 00:00:00 +0000 UTC");
    }

    #[test]
    fn day_key_uses_author_calendar_day() {
        let late = DateTime::parse_from_rfc3339("2024-03-05T23:30:00-05:00").unwrap();
        assert_eq!(day_key(Some(&late)), "2024-03-05 00:00:00 +0000 UTC");
        assert_eq!(day_key(None), UNKNOWN_DAY);
    }

    #[test]
    fn strips_all_relative_markers() {
        assert_eq!(strip_relative_markers("../../lib/util"), "lib/util");
        assert_eq!(strip_relative_markers("react"), "react");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let v: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup_preserving_order(&v), vec!["b", "a", "c"]);
    }
}

use gdrive_core::DriveFile;
use regex::Regex;
use time::Month;

use super::calendar::month_code;

/// Compiled name pattern for locating a child entry in a listing.
///
/// Matching is an unanchored regex search: remote names carry annotations
/// around the date parts (`05 - daily report.zip`), so equality would miss.
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn year(year: i32) -> Result<Self, regex::Error> {
        Self::new(&regex::escape(&year.to_string()))
    }

    pub fn month(month: Month) -> Result<Self, regex::Error> {
        Self::new(&regex::escape(month_code(month)))
    }

    /// Zero-padded day, anything, then `.zip`.
    pub fn day(day: u8) -> Result<Self, regex::Error> {
        Self::new(&format!(r"{day:02}.*\.zip"))
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// First entry, in listing order, whose name matches `pattern`.
pub fn find_child_by_pattern<'a>(
    entries: &'a [DriveFile],
    pattern: &NamePattern,
) -> Option<&'a DriveFile> {
    entries.iter().find(|entry| pattern.is_match(&entry.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> DriveFile {
        DriveFile {
            id: id.into(),
            name: name.into(),
            mime_type: "application/zip".into(),
        }
    }

    #[test]
    fn day_pattern_accepts_annotated_names() {
        let pattern = NamePattern::day(5).unwrap();
        assert!(pattern.is_match("05.zip"));
        assert!(pattern.is_match("05 - market close.zip"));
        assert!(!pattern.is_match("05 - market close.rar"));
        assert!(!pattern.is_match("15 - close.zip"));
    }

    #[test]
    fn day_pattern_escapes_the_extension_dot() {
        let pattern = NamePattern::day(7).unwrap();
        assert!(!pattern.is_match("07-backupxzip"));
        assert_eq!(pattern.as_str(), r"07.*\.zip");
    }

    #[test]
    fn first_match_in_listing_order_wins() {
        let entries = vec![
            entry("a", "04 old.zip"),
            entry("b", "05 first.zip"),
            entry("c", "05 second.zip"),
        ];
        let pattern = NamePattern::day(5).unwrap();
        let found = find_child_by_pattern(&entries, &pattern).unwrap();
        assert_eq!(found.id, "b");
    }

    #[test]
    fn no_match_is_none() {
        let entries = vec![entry("a", "2023"), entry("b", "2022")];
        let pattern = NamePattern::year(2024).unwrap();
        assert!(find_child_by_pattern(&entries, &pattern).is_none());
        assert!(find_child_by_pattern(&[], &pattern).is_none());
    }

    #[test]
    fn month_pattern_uses_month_code() {
        let entries = vec![entry("feb", "FEB"), entry("mar", "MAR 2024")];
        let pattern = NamePattern::month(Month::March).unwrap();
        assert_eq!(find_child_by_pattern(&entries, &pattern).unwrap().id, "mar");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Feed-provided unique id, or the entry link when the feed has none.
    pub id: String,
    pub title: String,
    pub content: String,
    pub published: DateTime<Utc>,
    pub link: Option<String>,
    pub feed_name: String,
}

impl NewsItem {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    pub fn date_label(&self) -> String {
        self.published.format("%Y-%m-%d").to_string()
    }

    /// Whether the title contains `needle`, ignoring case.
    pub fn title_matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Order items newest first. Items published at the same instant keep their
/// relative order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.published.cmp(&a.published));
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, title: &str, published: &str) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("Body of {}", title),
        published: DateTime::parse_from_rfc3339(published)
            .unwrap()
            .with_timezone(&Utc),
        link: Some(format!("https://archlinux.org/news/{}/", id)),
        feed_name: "Arch Linux News".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_with_title() {
        let item = sample_item("a", "Glibc update", "2024-01-01T00:00:00Z");
        assert_eq!(item.display_title(), "Glibc update");
    }

    #[test]
    fn test_display_title_without_title() {
        let item = sample_item("a", "", "2024-01-01T00:00:00Z");
        assert_eq!(item.display_title(), "(Untitled)");
    }

    #[test]
    fn test_date_label() {
        let item = sample_item("a", "x", "2024-03-09T23:30:00Z");
        assert_eq!(item.date_label(), "2024-03-09");
    }

    #[test]
    fn test_title_matches_case_insensitive() {
        let item = sample_item("a", "Manual intervention for OpenSSH", "2024-01-01T00:00:00Z");
        assert!(item.title_matches("openssh"));
        assert!(item.title_matches("MANUAL"));
        assert!(!item.title_matches("glibc"));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut items = vec![
            sample_item("old", "Old", "2023-01-01T00:00:00Z"),
            sample_item("new", "New", "2024-06-01T00:00:00Z"),
            sample_item("mid", "Mid", "2024-01-01T00:00:00Z"),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}

use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_RECENT_SEARCHES: usize = 5;

/// Most-recent-first list of searched city names, without duplicates and
/// never longer than [`MAX_RECENT_SEARCHES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecentSearches(Vec<String>);

impl<'de> Deserialize<'de> for RecentSearches {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Self::from_entries)
    }
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted entries, re-applying dedup and the length cap.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        // Oldest first so the head of the stored list ends up at the front.
        for city in entries.into_iter().rev() {
            list.push(city);
        }
        list
    }

    /// Move `city` to the front, evicting the oldest entry past the cap.
    pub fn push(&mut self, city: impl Into<String>) {
        let city = city.into();
        if city.trim().is_empty() {
            return;
        }

        self.0.retain(|c| *c != city);
        self.0.insert(0, city);
        self.0.truncate(MAX_RECENT_SEARCHES);
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_city_twice_keeps_one_entry() {
        let mut list = RecentSearches::new();
        list.push("Cluj");
        list.push("Cluj");

        assert_eq!(list.len(), 1);
        assert_eq!(list.most_recent(), Some("Cluj"));
    }

    #[test]
    fn research_moves_city_to_front() {
        let mut list = RecentSearches::new();
        list.push("Cluj");
        list.push("Iasi");
        list.push("Brasov");
        list.push("Cluj");

        let entries: Vec<_> = list.iter().collect();
        assert_eq!(entries, ["Cluj", "Brasov", "Iasi"]);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut list = RecentSearches::new();
        for city in ["A", "B", "C", "D", "E", "F"] {
            list.push(city);
        }

        assert_eq!(list.len(), MAX_RECENT_SEARCHES);
        let entries: Vec<_> = list.iter().collect();
        assert_eq!(entries, ["F", "E", "D", "C", "B"]);
    }

    #[test]
    fn blank_names_are_ignored() {
        let mut list = RecentSearches::new();
        list.push("   ");
        assert!(list.is_empty());
    }

    #[test]
    fn from_entries_preserves_order_and_enforces_invariants() {
        let list = RecentSearches::from_entries(["A", "B", "A", "C", "D", "E", "F", "G"]);
        let entries: Vec<_> = list.iter().collect();
        assert_eq!(entries, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn deserializing_enforces_cap_and_dedup() {
        let list: RecentSearches =
            serde_json::from_str(r#"["A","A","B","C","D","E","F","G"]"#).unwrap();

        assert_eq!(list.len(), MAX_RECENT_SEARCHES);
        let entries: Vec<_> = list.iter().collect();
        assert_eq!(entries, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn serializes_as_plain_json_array() {
        let mut list = RecentSearches::new();
        list.push("Cluj");
        list.push("Sibiu");

        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["Sibiu","Cluj"]"#);

        let back: RecentSearches = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }
}

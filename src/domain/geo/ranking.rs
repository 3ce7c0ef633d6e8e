//! Suggestion ranking
//!
//! Area-level results (villages, suburbs, ...) outrank points of interest,
//! and among equals the shorter, more specific label wins. The sort is
//! stable, so provider order breaks remaining ties.

use super::Suggestion;

/// Place types treated as area-level matches
pub const DEFAULT_LOCALITY_TYPES: [&str; 8] = [
    "village",
    "hamlet",
    "suburb",
    "neighbourhood",
    "residential",
    "district",
    "locality",
    "quarter",
];

/// Orders suggestions by locality relevance, then label length
#[derive(Debug, Clone)]
pub struct SuggestionRanker {
    locality_types: Vec<String>,
}

impl SuggestionRanker {
    pub fn new() -> Self {
        Self::with_locality_types(DEFAULT_LOCALITY_TYPES)
    }

    /// Uses a custom set of locality types; matching is case-insensitive
    pub fn with_locality_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let locality_types = types
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self { locality_types }
    }

    pub fn locality_types(&self) -> &[String] {
        &self.locality_types
    }

    /// 0 for area-level types, 1 for everything else
    pub fn locality_score(&self, suggestion: &Suggestion) -> u8 {
        let place_type = suggestion.place_type.to_lowercase();

        if self
            .locality_types
            .iter()
            .any(|t| place_type.contains(t.as_str()))
        {
            0
        } else {
            1
        }
    }

    pub fn rank(&self, mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        suggestions.sort_by_key(|s| (self.locality_score(s), s.label.chars().count()));
        suggestions
    }
}

impl Default for SuggestionRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::suggestion::fixtures::suggestion;

    fn labels(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_village_outranks_restaurant_of_equal_length() {
        let ranked = SuggestionRanker::new().rank(vec![
            suggestion("Hampi Cafe", "restaurant", "India"),
            suggestion("Hampi Town", "village", "India"),
        ]);

        assert_eq!(labels(&ranked), vec!["Hampi Town", "Hampi Cafe"]);
    }

    #[test]
    fn test_shorter_label_wins_between_suburbs() {
        let ranked = SuggestionRanker::new().rank(vec![
            suggestion("Koramangala 5th Block, Bengaluru", "suburb", "India"),
            suggestion("Koramangala, Bengaluru", "suburb", "India"),
        ]);

        assert_eq!(
            labels(&ranked),
            vec!["Koramangala, Bengaluru", "Koramangala 5th Block, Bengaluru"]
        );
    }

    #[test]
    fn test_locality_beats_shorter_poi() {
        let ranked = SuggestionRanker::new().rank(vec![
            suggestion("Toit", "pub", "India"),
            suggestion("Indiranagar, Bengaluru", "neighbourhood", "India"),
        ]);

        assert_eq!(labels(&ranked)[0], "Indiranagar, Bengaluru");
    }

    #[test]
    fn test_substring_match_on_type() {
        let ranker = SuggestionRanker::new();
        assert_eq!(ranker.locality_score(&suggestion("x", "city_district", "India")), 0);
        assert_eq!(ranker.locality_score(&suggestion("x", "Residential", "India")), 0);
        assert_eq!(ranker.locality_score(&suggestion("x", "cafe", "India")), 1);
    }

    #[test]
    fn test_sort_is_stable() {
        let ranked = SuggestionRanker::new().rank(vec![
            suggestion("Alpha", "cafe", "India"),
            suggestion("Bravo", "bank", "India"),
            suggestion("Gamma", "shop", "India"),
        ]);

        assert_eq!(labels(&ranked), vec!["Alpha", "Bravo", "Gamma"]);
    }

    #[test]
    fn test_custom_locality_types() {
        let ranker = SuggestionRanker::with_locality_types(["Town", " "]);
        assert_eq!(ranker.locality_types(), &["town".to_string()]);

        let ranked = ranker.rank(vec![
            suggestion("Ooty", "village", "India"),
            suggestion("Kodaikanal", "town", "India"),
        ]);

        assert_eq!(labels(&ranked), vec!["Kodaikanal", "Ooty"]);
    }
}

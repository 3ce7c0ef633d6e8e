//! Normalization of upstream place records into [`Suggestion`]s
//!
//! Every adapter maps its own schema onto [`RawPlace`] and then calls
//! [`build_suggestion`], so the address heuristics live in one place.

use super::Suggestion;

/// Place types whose own name doubles as their locality
const SELF_LOCALITY_TYPES: [&str; 4] = ["village", "hamlet", "residential", "suburb"];

/// Provider-agnostic view of one upstream record
#[derive(Debug, Clone, Default)]
pub struct RawPlace {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    /// Explicit suburb / neighbourhood / district field
    pub explicit_locality: Option<String>,
    /// Finer-grained area name used only as a last-resort name
    pub sub_locality: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub place_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub osm_id: Option<i64>,
    pub osm_type: Option<String>,
}

/// Builds a suggestion, applying name, locality, label and subtitle rules
pub fn build_suggestion(provider: &str, raw: RawPlace, default_country: &str) -> Suggestion {
    let name = resolve_name(&raw);
    let city = clean(raw.city.as_deref());
    let state = clean(raw.state.as_deref());
    let place_type = clean(raw.place_type.as_deref());
    let locality = infer_locality(raw.explicit_locality.as_deref(), &place_type, &name);

    let mut label = assemble_label(&name, &city, &state);
    let display_name = match clean(raw.display_name.as_deref()) {
        d if d.is_empty() => label.clone(),
        d => d,
    };
    if label.is_empty() {
        label = display_name.clone();
    }

    let country = match clean(raw.country.as_deref()) {
        c if c.is_empty() => default_country.to_string(),
        c => c,
    };

    let street = match (clean(raw.street.as_deref()), clean(raw.house_number.as_deref())) {
        (street, number) if street.is_empty() || number.is_empty() => street,
        (street, number) => format!("{} {}", number, street),
    };

    Suggestion {
        provider: provider.to_string(),
        subtitle: assemble_subtitle(&place_type, &city, &state),
        display_name,
        label,
        latitude: raw.latitude.filter(|v| v.is_finite()),
        longitude: raw.longitude.filter(|v| v.is_finite()),
        street,
        locality,
        city,
        state,
        postal_code: clean(raw.postal_code.as_deref()),
        country,
        place_type,
        osm_id: raw.osm_id,
        osm_type: raw.osm_type.filter(|t| !t.trim().is_empty()),
    }
}

/// Explicit name, else city, else sub-locality
pub fn resolve_name(raw: &RawPlace) -> String {
    [&raw.name, &raw.city, &raw.sub_locality]
        .into_iter()
        .map(|field| clean(field.as_deref()))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Explicit locality if present, else the name itself for area-like types
pub fn infer_locality(explicit: Option<&str>, place_type: &str, name: &str) -> String {
    let explicit = clean(explicit);
    if !explicit.is_empty() {
        return explicit;
    }

    let place_type = place_type.to_lowercase();
    if SELF_LOCALITY_TYPES.contains(&place_type.as_str()) {
        return name.to_string();
    }

    String::new()
}

/// `name[, city][, state]`, skipping segments that repeat the previous one
pub fn assemble_label(name: &str, city: &str, state: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    if !name.is_empty() {
        parts.push(name);
    }
    if !city.is_empty() && !eq_ignore_case(city, name) {
        parts.push(city);
    }
    if !state.is_empty() && !eq_ignore_case(state, city) {
        parts.push(state);
    }

    if parts.is_empty() {
        return name.to_string();
    }

    parts.join(", ")
}

/// Non-empty `type, city, state`
pub fn assemble_subtitle(place_type: &str, city: &str, state: &str) -> String {
    [place_type, city, state]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keeps only suggestions whose country matches the bias
///
/// An empty or absent bias keeps everything.
pub fn filter_by_country(suggestions: Vec<Suggestion>, bias: Option<&str>) -> Vec<Suggestion> {
    let Some(bias) = bias.map(str::trim).filter(|b| !b.is_empty()) else {
        return suggestions;
    };

    suggestions
        .into_iter()
        .filter(|s| matches_country(&s.country, bias))
        .collect()
}

/// Case-insensitive country match, accepting territory codes for common names
pub fn matches_country(country: &str, bias: &str) -> bool {
    let country = country.trim();
    let bias = bias.trim();

    if eq_ignore_case(country, bias) {
        return true;
    }

    let bias_name = territory_name(bias);
    let country_name = territory_name(country);

    match (bias_name, country_name) {
        (Some(b), _) if eq_ignore_case(b, country) => true,
        (_, Some(c)) if eq_ignore_case(c, bias) => true,
        (Some(b), Some(c)) => b == c,
        _ => false,
    }
}

/// Maps an ISO 3166 alpha-2 code to the English country name upstreams report
pub fn territory_name(code: &str) -> Option<&'static str> {
    let name = match code.trim().to_ascii_uppercase().as_str() {
        "IN" => "India",
        "US" => "United States",
        "GB" | "UK" => "United Kingdom",
        "FR" => "France",
        "DE" => "Germany",
        "ES" => "Spain",
        "IT" => "Italy",
        "NL" => "Netherlands",
        "CA" => "Canada",
        "AU" => "Australia",
        "NZ" => "New Zealand",
        "IE" => "Ireland",
        "JP" => "Japan",
        "CN" => "China",
        "SG" => "Singapore",
        "AE" => "United Arab Emirates",
        "LK" => "Sri Lanka",
        "NP" => "Nepal",
        "BD" => "Bangladesh",
        "PK" => "Pakistan",
        "BR" => "Brazil",
        "MX" => "Mexico",
        "ZA" => "South Africa",
        _ => return None,
    };

    Some(name)
}

fn clean(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::suggestion::fixtures::suggestion;

    fn raw(name: &str, city: &str, state: &str) -> RawPlace {
        RawPlace {
            name: Some(name.to_string()),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_label_joins_name_city_state() {
        assert_eq!(
            assemble_label("Indiranagar", "Bengaluru", "Karnataka"),
            "Indiranagar, Bengaluru, Karnataka"
        );
    }

    #[test]
    fn test_label_omits_state_equal_to_city() {
        assert_eq!(assemble_label("Connaught Place", "Delhi", "DELHI"), "Connaught Place, Delhi");
    }

    #[test]
    fn test_label_omits_city_equal_to_name() {
        assert_eq!(assemble_label("Mysuru", "mysuru", "Karnataka"), "Mysuru, Karnataka");
    }

    #[test]
    fn test_label_falls_back_to_bare_name() {
        assert_eq!(assemble_label("", "", ""), "");
        assert_eq!(assemble_label("Goa", "", ""), "Goa");
    }

    #[test]
    fn test_name_falls_back_to_city_then_sub_locality() {
        let mut place = RawPlace {
            city: Some("Pune".to_string()),
            sub_locality: Some("Kothrud".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_name(&place), "Pune");

        place.city = Some("  ".to_string());
        assert_eq!(resolve_name(&place), "Kothrud");
    }

    #[test]
    fn test_locality_prefers_explicit_field() {
        assert_eq!(infer_locality(Some("Koramangala"), "village", "Ejipura"), "Koramangala");
    }

    #[test]
    fn test_village_is_its_own_locality() {
        assert_eq!(infer_locality(None, "village", "Hampi"), "Hampi");
        assert_eq!(infer_locality(None, "Hamlet", "Kodachadri"), "Kodachadri");
    }

    #[test]
    fn test_point_of_interest_has_no_inferred_locality() {
        assert_eq!(infer_locality(None, "restaurant", "Toit"), "");
    }

    #[test]
    fn test_subtitle_skips_empty_parts() {
        assert_eq!(assemble_subtitle("suburb", "", "Karnataka"), "suburb, Karnataka");
        assert_eq!(assemble_subtitle("", "", ""), "");
    }

    #[test]
    fn test_build_suggestion_defaults_country() {
        let s = build_suggestion("photon", raw("Indiranagar", "Bengaluru", "Karnataka"), "India");

        assert_eq!(s.country, "India");
        assert_eq!(s.label, "Indiranagar, Bengaluru, Karnataka");
        assert_eq!(s.display_name, s.label);
        assert_eq!(s.provider, "photon");
    }

    #[test]
    fn test_build_suggestion_label_never_empty_with_name_like_field() {
        let place = RawPlace {
            sub_locality: Some("Whitefield".to_string()),
            ..Default::default()
        };
        let s = build_suggestion("photon", place, "India");
        assert_eq!(s.label, "Whitefield");
    }

    #[test]
    fn test_build_suggestion_street_with_house_number() {
        let mut place = raw("Toit", "Bengaluru", "Karnataka");
        place.street = Some("100 Feet Road".to_string());
        place.house_number = Some("298".to_string());

        let s = build_suggestion("nominatim", place, "India");
        assert_eq!(s.street, "298 100 Feet Road");
    }

    #[test]
    fn test_country_filter_with_territory_code() {
        let suggestions = vec![
            suggestion("Paris", "city", "France"),
            suggestion("Pondicherry", "city", "India"),
        ];

        let filtered = filter_by_country(suggestions, Some("IN"));

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].label, "Pondicherry");
    }

    #[test]
    fn test_country_filter_without_bias_keeps_all() {
        let suggestions = vec![suggestion("Paris", "city", "France")];
        assert_eq!(filter_by_country(suggestions.clone(), None).len(), 1);
        assert_eq!(filter_by_country(suggestions, Some("  ")).len(), 1);
    }

    #[test]
    fn test_matches_country_variants() {
        assert!(matches_country("India", "in"));
        assert!(matches_country("india", "India"));
        assert!(matches_country("United Kingdom", "UK"));
        assert!(matches_country("GB", "UK"));
        assert!(!matches_country("France", "IN"));
        assert!(!matches_country("", "IN"));
    }
}

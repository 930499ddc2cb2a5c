//! Static country → language table used by geolocation-based resolution.

/// ISO 3166-1 alpha-2 country code → language code.
const COUNTRY_LANGUAGES: &[(&str, &str)] = &[
    // Former Yugoslav region
    ("RS", "sr"),
    ("BA", "sr"),
    ("ME", "sr"),
    ("HR", "sr"),
    ("MK", "sr"),
    ("SI", "sr"),
    // German-speaking
    ("DE", "de"),
    ("AT", "de"),
    ("CH", "de"),
    // English-speaking
    ("US", "en"),
    ("GB", "en"),
    ("CA", "en"),
    ("AU", "en"),
    ("NZ", "en"),
];

/// Map a country code to the site language spoken there.
pub fn language_for_country(country_code: &str) -> Option<&'static str> {
    let country = country_code.trim();
    COUNTRY_LANGUAGES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(country))
        .map(|(_, language)| *language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balkan_countries_map_to_serbian() {
        for country in ["RS", "BA", "ME", "HR", "MK", "SI"] {
            assert_eq!(language_for_country(country), Some("sr"), "{}", country);
        }
    }

    #[test]
    fn test_dach_countries_map_to_german() {
        for country in ["DE", "AT", "CH"] {
            assert_eq!(language_for_country(country), Some("de"), "{}", country);
        }
    }

    #[test]
    fn test_anglosphere_maps_to_english() {
        for country in ["US", "GB", "CA", "AU", "NZ"] {
            assert_eq!(language_for_country(country), Some("en"), "{}", country);
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(language_for_country("rs"), Some("sr"));
        assert_eq!(language_for_country(" at "), Some("de"));
    }

    #[test]
    fn test_unknown_country() {
        assert_eq!(language_for_country("FR"), None);
        assert_eq!(language_for_country(""), None);
    }
}

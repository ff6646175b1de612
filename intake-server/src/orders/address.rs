//! Free-text address resolver
//!
//! Splits a postal address on commas into street / city / postal code.
//! Pure and total: malformed input degrades to empty parts, it never
//! fails order creation.

/// Parsed address parts. Missing segments are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// Parse a free-text address.
///
/// - 3+ comma segments: last = postal code, second-to-last = city,
///   the rest (re-joined) = street
/// - exactly 2: street, city
/// - 1: the whole input is the street
pub fn parse(raw: &str) -> AddressParts {
    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.len() {
        0 => AddressParts::default(),
        1 => AddressParts {
            street: segments[0].to_string(),
            ..Default::default()
        },
        2 => AddressParts {
            street: segments[0].to_string(),
            city: segments[1].to_string(),
            ..Default::default()
        },
        n => AddressParts {
            street: segments[..n - 2].join(", "),
            city: segments[n - 2].to_string(),
            postal_code: segments[n - 1].to_string(),
        },
    }
}

/// Normalize free text for equality comparison: lower-case, strip
/// punctuation, collapse runs of whitespace. Used when matching a
/// request address against the customer's saved profile address.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_address() {
        let parts = parse("123 Oak St, Tofino, V0R 2Z0");
        assert_eq!(parts.street, "123 Oak St");
        assert_eq!(parts.city, "Tofino");
        assert_eq!(parts.postal_code, "V0R 2Z0");
    }

    #[test]
    fn extra_segments_fold_into_street() {
        let parts = parse("Unit 4, 55 Harbour Rd, Campbell River, V9W 1A1");
        assert_eq!(parts.street, "Unit 4, 55 Harbour Rd");
        assert_eq!(parts.city, "Campbell River");
        assert_eq!(parts.postal_code, "V9W 1A1");
    }

    #[test]
    fn two_segments_mean_street_and_city() {
        let parts = parse("9 Main St, Tofino");
        assert_eq!(parts.street, "9 Main St");
        assert_eq!(parts.city, "Tofino");
        assert_eq!(parts.postal_code, "");
    }

    #[test]
    fn single_segment_is_street_only() {
        let parts = parse("just a street");
        assert_eq!(parts.street, "just a street");
        assert_eq!(parts.city, "");
    }

    #[test]
    fn malformed_input_degrades_gracefully() {
        assert_eq!(parse(""), AddressParts::default());
        assert_eq!(parse(" , , "), AddressParts::default());
        // dangling commas are dropped, not counted as segments
        let parts = parse("5 Dock St,, Ucluelet,");
        assert_eq!(parts.street, "5 Dock St");
        assert_eq!(parts.city, "Ucluelet");
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("123  Oak St."), "123 oak st");
        assert_eq!(normalize("123 Oak St, Tofino"), normalize("123 OAK ST  TOFINO!"));
    }
}

//! Checkout form helpers.

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Whether a section is one of the required sections, which stay expanded.
pub fn is_required_section(section: &str, required: &[String]) -> bool {
    required
        .iter()
        .any(|marker| !marker.is_empty() && section.contains(marker.as_str()))
}

/// Expansion state of a section after the user toggles it from `expanded`.
pub fn toggled(section: &str, expanded: bool, required: &[String]) -> bool {
    if is_required_section(section, required) {
        return true;
    }

    !expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<String> {
        vec!["customer-info".to_string(), "order-review".to_string()]
    }

    #[test]
    fn strips_everything_but_digits() {
        assert_eq!(digits_only("+98 (912) 555-01a2"), "98912555012");
        assert_eq!(digits_only("۰۹۱۲"), "");
        assert_eq!(digits_only(""), "");
    }

    #[test]
    fn optional_sections_flip() {
        assert!(!toggled("shipping-notes", true, &required()));
        assert!(toggled("shipping-notes", false, &required()));
    }

    #[test]
    fn required_sections_never_collapse() {
        assert!(toggled("section-customer-info", true, &required()));
        assert!(toggled("order-review", false, &required()));
    }

    #[test]
    fn empty_marker_matches_nothing() {
        assert!(!is_required_section("anything", &[String::new()]));
    }
}

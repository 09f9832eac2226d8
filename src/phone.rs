//! Phone-number normalization into the session provider's addressing format.

/// Normalize a user-supplied phone string into an address token.
///
/// Strips every non-digit character, prepends `default_country_prefix` when
/// the digit string does not already start with it, and appends the
/// provider's domain suffix (`@c.us` for WhatsApp Web).
///
/// Total over any input: malformed input produces a syntactically valid but
/// semantically meaningless token. Callers validate non-emptiness of the raw
/// input before calling. The digit portion is stable under re-application;
/// the domain suffix is appended unconditionally, so the full token is not.
pub fn normalize(raw: &str, default_country_prefix: &str, domain_suffix: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with(default_country_prefix) {
        format!("{digits}@{domain_suffix}")
    } else {
        format!("{default_country_prefix}{digits}@{domain_suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_international_format() {
        assert_eq!(
            normalize("+375 29 1234567", "375", "c.us"),
            "375291234567@c.us"
        );
    }

    #[test]
    fn test_local_format_gets_prefix() {
        assert_eq!(normalize("291234567", "375", "c.us"), "375291234567@c.us");
    }

    #[test]
    fn test_already_prefixed_not_doubled() {
        assert_eq!(normalize("375291234567", "375", "c.us"), "375291234567@c.us");
    }

    #[test]
    fn test_punctuation_stripped() {
        assert_eq!(
            normalize("+375 (29) 123-45-67", "375", "c.us"),
            "375291234567@c.us"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = normalize("+375 29 1234567", "375", "c.us");
        let b = normalize("+375 29 1234567", "375", "c.us");
        assert_eq!(a, b);
    }

    #[test]
    fn test_digit_portion_idempotent() {
        // Re-normalizing the digit portion of an already-normalized token
        // must not change it. The suffix is excluded from this scope.
        let token = normalize("291234567", "375", "c.us");
        let digits = token.split('@').next().unwrap();
        assert_eq!(normalize(digits, "375", "c.us"), token);
    }

    #[test]
    fn test_empty_input_degenerate_token() {
        assert_eq!(normalize("", "375", "c.us"), "375@c.us");
    }

    #[test]
    fn test_no_digits_at_all() {
        assert_eq!(normalize("call me", "375", "c.us"), "375@c.us");
    }

    #[test]
    fn test_other_prefix() {
        assert_eq!(normalize("7900123", "49", "c.us"), "497900123@c.us");
    }
}

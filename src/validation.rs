use std::sync::OnceLock;

use regex::Regex;

const MAX_NAME_LEN: usize = 100;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
}

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[\w .'-]+$").expect("name pattern is valid"))
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// Canonical form of an address: trimmed and lowercased. Every store keys
/// on this form, so case variants of one mailbox are a single subscriber.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Word characters, space, period, apostrophe and hyphen; 1 to 100 characters.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_LEN && name_re().is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_addresses() {
        for email in ["ursula@example.com", "a.b+c@mail.example.co.uk", "x@y.z"] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        let cases = [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@example",
            "user@@example.com",
            "user name@example.com",
            "user@exam ple.com",
            "user@example.",
            "user@example.com ",
        ];
        for email in cases {
            assert!(!is_valid_email(email), "{email:?} should be invalid");
        }
    }

    #[test]
    fn test_normalize_email_folds_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_accepts_reasonable_names() {
        for name in ["Ursula K. Le Guin", "O'Brien", "Jean-Luc", "José", "a"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("<script>"));
        assert!(!is_valid_name("name; DROP TABLE"));
        assert!(!is_valid_name(&"a".repeat(101)));
        assert!(is_valid_name(&"a".repeat(100)));
    }
}

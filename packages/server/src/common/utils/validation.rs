use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    // E.164: leading '+', 8-15 digits, first digit non-zero
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+[1-9][0-9]{7,14}$").unwrap();
}

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip the separators people type into phone fields ("+251 911-000 000").
pub fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@chamber.org.et"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+251911000000"));
        assert!(is_valid_phone("+15551234567"));
        assert!(!is_valid_phone("0911000000"));
        assert!(!is_valid_phone("+0123456789"));
        assert!(!is_valid_phone("+12"));
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+251 911-000 000"), "+251911000000");
        assert_eq!(normalize_phone("+1 (555) 123.4567"), "+15551234567");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }
}

/// Mask a phone number for logs, keeping the last four digits.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask_phone("+251911000123"), "***0123");
    }

    #[test]
    fn test_mask_short_input() {
        assert_eq!(mask_phone("+12"), "****");
    }
}

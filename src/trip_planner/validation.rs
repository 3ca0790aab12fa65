use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PASSENGER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z\s\-']+$")
        .expect("name pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Normalized email, or the error shown to the user.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    if is_valid_email(&email) {
        Ok(email)
    } else {
        Err("Invalid email address".to_string())
    }
}

pub fn validate_passenger_name(name: &str) -> Result<(), String> {
    let length = name.chars().count();
    if length < 2 {
        return Err("Name must be at least 2 characters".to_string());
    }
    if length > 100 {
        return Err("Name too long".to_string());
    }
    if !PASSENGER_NAME.is_match(name) {
        return Err("Name can only contain letters, spaces, hyphens, and apostrophes".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails() {
        assert_eq!(
            normalize_email("  Ada.Lovelace@Example.COM ").unwrap(),
            "ada.lovelace@example.com"
        );
        assert!(is_valid_email("o'brien+trips@mail.co.uk"));
        assert!(normalize_email("ada@").is_err());
        assert!(normalize_email("not an email").is_err());
    }

    #[test]
    fn test_names() {
        assert!(validate_passenger_name("Mary-Jane O'Neil").is_ok());
        assert_eq!(
            validate_passenger_name("A").unwrap_err(),
            "Name must be at least 2 characters"
        );
        assert_eq!(validate_passenger_name(&"a".repeat(101)).unwrap_err(), "Name too long");
        assert_eq!(
            validate_passenger_name("R2-D2").unwrap_err(),
            "Name can only contain letters, spaces, hyphens, and apostrophes"
        );
    }
}

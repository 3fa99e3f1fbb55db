use lazy_static::lazy_static;
use regex::Regex;

pub const MSG_BLANK: &str = "cannot be blank";
pub const MSG_BAD_EMAIL: &str = "must be a valid email address";
pub const MSG_PASSWORD_LENGTH: &str = "the length must be between 8 and 20";
pub const MSG_DUPLICATE_EMAIL: &str = "email already exists";
pub const MSG_BAD_EXPIRE: &str = "value must be integer greater than zero";
pub const MSG_BAD_KIND: &str = "must be a valid value";
pub const MSG_BAD_CREDENTIALS: &str = "Email or password incorrect";

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 20;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile");
}

/// Require a non-blank value.
pub fn required(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(MSG_BLANK.to_string())
    } else {
        None
    }
}

/// Require a non-blank, well-formed email address.
pub fn valid_email(value: &str) -> Option<String> {
    if let Some(message) = required(value) {
        return Some(message);
    }
    if !EMAIL_RE.is_match(value.trim()) {
        return Some(MSG_BAD_EMAIL.to_string());
    }
    None
}

/// Require a password with length in [PASSWORD_MIN_LEN, PASSWORD_MAX_LEN].
pub fn valid_password(value: &str) -> Option<String> {
    if let Some(message) = required(value) {
        return Some(message);
    }
    let len = value.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Some(MSG_PASSWORD_LENGTH.to_string());
    }
    None
}

/// Parse the expiration field as a positive whole number of days.
/// Non-numeric and non-positive inputs report the same message.
pub fn parse_expire_days(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MSG_BLANK.to_string());
    }
    match trimmed.parse::<i64>() {
        Ok(days) if days > 0 => {
            u32::try_from(days).map_err(|_| MSG_BAD_EXPIRE.to_string())
        }
        Ok(_) => Err(MSG_BAD_EXPIRE.to_string()),
        Err(_) => Err(MSG_BAD_EXPIRE.to_string()),
    }
}

/// Resolve the visibility selector; exactly `Public` or `Private` is
/// accepted.
pub fn parse_snippet_kind(value: &str) -> Result<bool, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MSG_BLANK.to_string());
    }
    match trimmed {
        "Public" => Ok(true),
        "Private" => Ok(false),
        _ => Err(MSG_BAD_KIND.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(required(""), Some(MSG_BLANK.to_string()));
        assert_eq!(required("   "), Some(MSG_BLANK.to_string()));
        assert_eq!(required("x"), None);
    }

    #[test]
    fn email_format_is_checked_after_presence() {
        assert_eq!(valid_email(""), Some(MSG_BLANK.to_string()));
        assert_eq!(valid_email("v@a"), Some(MSG_BAD_EMAIL.to_string()));
        assert_eq!(valid_email("not an email"), Some(MSG_BAD_EMAIL.to_string()));
        assert_eq!(valid_email("conor@mail.com"), None);
    }

    #[test]
    fn password_length_bounds() {
        assert_eq!(valid_password(""), Some(MSG_BLANK.to_string()));
        assert_eq!(
            valid_password("1234567"),
            Some(MSG_PASSWORD_LENGTH.to_string())
        );
        assert_eq!(
            valid_password("123456789012345678901"),
            Some(MSG_PASSWORD_LENGTH.to_string())
        );
        assert_eq!(valid_password("12345678"), None);
        assert_eq!(valid_password("12345678901234567890"), None);
    }

    #[test]
    fn expire_days_must_be_a_positive_integer() {
        assert_eq!(parse_expire_days(""), Err(MSG_BLANK.to_string()));
        assert_eq!(parse_expire_days("ff"), Err(MSG_BAD_EXPIRE.to_string()));
        assert_eq!(parse_expire_days("-3"), Err(MSG_BAD_EXPIRE.to_string()));
        assert_eq!(parse_expire_days("0"), Err(MSG_BAD_EXPIRE.to_string()));
        assert_eq!(parse_expire_days("150"), Ok(150));
    }

    #[test]
    fn snippet_kind_accepts_exactly_two_values() {
        assert_eq!(parse_snippet_kind(""), Err(MSG_BLANK.to_string()));
        assert_eq!(parse_snippet_kind("Bad"), Err(MSG_BAD_KIND.to_string()));
        assert_eq!(parse_snippet_kind("public"), Err(MSG_BAD_KIND.to_string()));
        assert_eq!(parse_snippet_kind("Public"), Ok(true));
        assert_eq!(parse_snippet_kind("Private"), Ok(false));
    }
}

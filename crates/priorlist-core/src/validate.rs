use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Raw form input: field name to submitted value. Absent fields read as empty.
pub type FormData = BTreeMap<String, String>;

/// Per-field error messages. A field is valid exactly when its key is absent.
pub type FieldErrors = BTreeMap<&'static str, String>;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_TITLE_LEN: usize = 150;

fn field<'a>(data: &'a FormData, name: &str) -> &'a str {
    data.get(name).map(String::as_str).unwrap_or_default()
}

/// Registration form: name, email, password with composition rules, and a
/// matching confirmation. First failing rule wins; one message per field.
pub fn registration(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if field(data, "name").is_empty() {
        errors.insert("name", "Name is required".to_string());
    }

    check_email(data, &mut errors);
    check_strong_password(data, &mut errors);
    check_confirm_password(data, &mut errors);

    errors
}

/// Login form: email shape plus minimum password length, no composition rules.
pub fn login(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check_email(data, &mut errors);

    let password = field(data, "password");
    if password.is_empty() {
        errors.insert("password", "Password is required".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
    }

    errors
}

/// Password-reset request form: just the email.
pub fn forgot_password(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(data, &mut errors);
    errors
}

/// New-password form after a reset: length check and confirmation only.
pub fn update_password(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let password = field(data, "password");
    if password.is_empty() {
        errors.insert("password", "Password is required".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
    }

    check_confirm_password(data, &mut errors);
    errors
}

/// Task create/edit form: title required after trimming, capped at 150 chars.
pub fn task_form(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let title = field(data, "title");
    if title.trim().is_empty() {
        errors.insert("title", "Title is required".to_string());
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.insert(
            "title",
            format!("Title cannot exceed {MAX_TITLE_LEN} characters"),
        );
    }

    errors
}

fn check_email(data: &FormData, errors: &mut FieldErrors) {
    let email = field(data, "email");
    if email.is_empty() {
        errors.insert("email", "Email is required".to_string());
    } else if !EMAIL_RE.is_match(email) {
        errors.insert("email", "Please enter a valid email address".to_string());
    }
}

fn check_strong_password(data: &FormData, errors: &mut FieldErrors) {
    let password = field(data, "password");

    if password.is_empty() {
        errors.insert("password", "Password is required".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.insert(
            "password",
            "Password must contain at least one uppercase letter".to_string(),
        );
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.insert(
            "password",
            "Password must contain at least one lowercase letter".to_string(),
        );
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.insert(
            "password",
            "Password must contain at least one number".to_string(),
        );
    } else if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        errors.insert(
            "password",
            "Password must contain at least one special character".to_string(),
        );
    }
}

fn check_confirm_password(data: &FormData, errors: &mut FieldErrors) {
    let confirm = field(data, "confirm_password");
    if confirm.is_empty() {
        errors.insert(
            "confirm_password",
            "Password confirmation is required".to_string(),
        );
    } else if confirm != field(data, "password") {
        errors.insert("confirm_password", "Passwords must match".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_title_is_required() {
        let errors = task_form(&form(&[("title", "")]));
        assert_eq!(errors.get("title").map(String::as_str), Some("Title is required"));
    }

    #[test]
    fn blank_title_is_required() {
        let errors = task_form(&form(&[("title", "   ")]));
        assert!(errors.contains_key("title"));
    }

    #[test]
    fn overlong_title_reports_length() {
        let long = "a".repeat(151);
        let errors = task_form(&form(&[("title", &long)]));
        assert_eq!(
            errors.get("title").map(String::as_str),
            Some("Title cannot exceed 150 characters")
        );
    }

    #[test]
    fn plain_title_passes() {
        let errors = task_form(&form(&[("title", "Buy milk")]));
        assert!(errors.is_empty());
    }

    #[test]
    fn short_password_reports_minimum_length() {
        let errors = registration(&form(&[
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("password", "abc"),
            ("confirm_password", "abc"),
        ]));
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Password must be at least 6 characters long")
        );
    }

    #[test]
    fn composed_password_passes_registration() {
        let errors = registration(&form(&[
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("password", "Abc123!"),
            ("confirm_password", "Abc123!"),
        ]));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn composition_rules_fire_in_order() {
        let base = [("name", "Ana"), ("email", "ana@example.com")];

        let no_upper = registration(&form(&[base[0], base[1], ("password", "abc123!"), ("confirm_password", "abc123!")]));
        assert!(no_upper.get("password").is_some_and(|m| m.contains("uppercase")));

        let no_digit = registration(&form(&[base[0], base[1], ("password", "Abcdef!"), ("confirm_password", "Abcdef!")]));
        assert!(no_digit.get("password").is_some_and(|m| m.contains("number")));

        let no_symbol = registration(&form(&[base[0], base[1], ("password", "Abc1234"), ("confirm_password", "Abc1234")]));
        assert!(no_symbol.get("password").is_some_and(|m| m.contains("special character")));
    }

    #[test]
    fn login_skips_composition_rules() {
        let errors = login(&form(&[("email", "ana@example.com"), ("password", "abcdef")]));
        assert!(errors.is_empty());
    }

    #[test]
    fn absent_fields_yield_required_errors_only() {
        let errors = registration(&FormData::new());
        assert_eq!(errors.get("name").map(String::as_str), Some("Name is required"));
        assert_eq!(errors.get("email").map(String::as_str), Some("Email is required"));
        assert_eq!(errors.get("password").map(String::as_str), Some("Password is required"));
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Password confirmation is required")
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["plainaddress", "a@b", "a@b.", "@example.com", "a b@example.com"] {
            let errors = forgot_password(&form(&[("email", bad)]));
            assert!(errors.contains_key("email"), "accepted {bad:?}");
        }
        let errors = forgot_password(&form(&[("email", "user.name+tag@example.co")]));
        assert!(errors.is_empty());
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let errors = update_password(&form(&[
            ("password", "abcdef"),
            ("confirm_password", "abcdeg"),
        ]));
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Passwords must match")
        );
    }

    #[test]
    fn validators_are_pure() {
        let data = form(&[("email", "not-an-email"), ("password", "x")]);
        assert_eq!(login(&data), login(&data));
    }
}

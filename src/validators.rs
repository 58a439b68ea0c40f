//! Client-side form rules. A failing rule yields the message shown next to
//! the field; nothing here touches the network.

use regex::Regex;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const SPECIAL_CHARS_PATTERN: &str = r#"[!@#$%^&*(),.?":{}|<>]"#;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    PasswordStrength,
    /// Matches the field against its confirmation value.
    PasswordMatch(String),
}

impl Rule {
    /// Checks a single value.
    /// # Errors
    /// Returns the user-facing message when the value fails the rule.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let passed = match self {
            Self::Required => !value.is_empty(),
            Self::Email => valid_email(value),
            Self::MinLength(min) => !value.is_empty() && value.chars().count() >= *min,
            Self::MaxLength(max) => !value.is_empty() && value.chars().count() <= *max,
            Self::PasswordStrength => strong_password(value),
            Self::PasswordMatch(confirm) => value == confirm,
        };

        if passed {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Required => "This field is required".to_string(),
            Self::Email => "Must be a valid email".to_string(),
            Self::MinLength(min) => format!("Must be at least {min} characters"),
            Self::MaxLength(max) => format!("Must be no more than {max} characters"),
            Self::PasswordStrength => {
                "Password must be at least 8 characters with uppercase, lowercase, number, and special character"
                    .to_string()
            }
            Self::PasswordMatch(_) => "Passwords do not match".to_string(),
        }
    }
}

/// Runs rules in order and stops at the first failure.
/// # Errors
/// Returns the message of the first failing rule.
pub fn validate(value: &str, rules: &[Rule]) -> Result<(), String> {
    rules.iter().try_for_each(|rule| rule.check(value))
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).map_or(false, |re| re.is_match(email))
}

pub fn strong_password(password: &str) -> bool {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special =
        Regex::new(SPECIAL_CHARS_PATTERN).map_or(false, |re| re.is_match(password));

    has_upper
        && has_lower
        && has_digit
        && has_special
        && password.chars().count() >= MIN_PASSWORD_LENGTH
}

//! Form-field validation shared by the auth and editor screens. Every rule is
//! a pure function over the raw input so it can run before any database call
//! is made; a failing rule is shown inline on the offending field and has no
//! side effects.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum workout name length, counted over the raw (untrimmed) input.
pub const MAX_WORKOUT_NAME_LENGTH: usize = 100;
/// Maximum description length.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
/// Upper bound for both sets and reps.
pub const MAX_SETS_REPS: i64 = 100;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// Accept a non-empty address matching the email pattern.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email_regex().is_match(email)
}

/// Accept passwords of at least [`MIN_PASSWORD_LENGTH`] characters.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Accept only a non-empty, byte-equal confirmation.
pub fn passwords_match(password: &str, confirm: &str) -> bool {
    !password.is_empty() && password == confirm
}

/// Accept display names between 2 and 50 characters after trimming.
pub fn is_valid_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (2..=50).contains(&len)
}

/// Accept workout names that are non-empty after trimming and no longer than
/// [`MAX_WORKOUT_NAME_LENGTH`] raw characters. A 100-character name passes;
/// 101 does not.
pub fn is_valid_workout_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().count() <= MAX_WORKOUT_NAME_LENGTH
}

/// The description is optional; when present it may not exceed
/// [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn is_valid_description(description: Option<&str>) -> bool {
    match description {
        None => true,
        Some(text) => text.chars().count() <= MAX_DESCRIPTION_LENGTH,
    }
}

/// Accept any non-empty exercise name.
pub fn is_valid_exercise_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Sets and reps share the same bound: a positive integer up to
/// [`MAX_SETS_REPS`].
pub fn is_valid_sets_or_reps(value: i64) -> bool {
    (1..=MAX_SETS_REPS).contains(&value)
}

/// String form of the above for raw field input; anything that fails to parse
/// is rejected.
pub fn parse_sets_or_reps(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| is_valid_sets_or_reps(*v))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ada@example.com", true)]
    #[case("ada.lovelace+tag@sub.example.org", true)]
    #[case("", false)]
    #[case("not-an-email", false)]
    #[case("missing@tld", false)]
    #[case("@example.com", false)]
    fn email_rule(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_valid_email(input), expected);
    }

    #[rstest]
    #[case("", false)]
    #[case("12345", false)]
    #[case("123456", true)]
    fn password_rule(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_valid_password(input), expected);
    }

    #[test]
    fn password_match_requires_non_empty() {
        assert!(passwords_match("secret", "secret"));
        assert!(!passwords_match("secret", "other"));
        assert!(!passwords_match("", ""));
    }

    #[rstest]
    #[case("A", false)]
    #[case("Al", true)]
    #[case("  Al  ", true)]
    fn name_rule(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_valid_name(input), expected);
    }

    #[test]
    fn name_rule_upper_bound() {
        assert!(is_valid_name(&"x".repeat(50)));
        assert!(!is_valid_name(&"x".repeat(51)));
    }

    #[test]
    fn workout_name_boundaries() {
        assert!(!is_valid_workout_name(""));
        assert!(!is_valid_workout_name("   "));
        assert!(is_valid_workout_name(&"x".repeat(100)));
        assert!(!is_valid_workout_name(&"x".repeat(101)));
    }

    #[test]
    fn description_is_optional_but_bounded() {
        assert!(is_valid_description(None));
        assert!(is_valid_description(Some(&"x".repeat(500))));
        assert!(!is_valid_description(Some(&"x".repeat(501))));
    }

    #[rstest]
    #[case("0", None)]
    #[case("1", Some(1))]
    #[case("100", Some(100))]
    #[case("101", None)]
    #[case("ten", None)]
    #[case(" 12 ", Some(12))]
    fn sets_reps_parsing(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_sets_or_reps(input), expected);
    }
}

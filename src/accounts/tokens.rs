use rand::{rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};

/// How long a verification or reset token stays valid.
pub const TOKEN_TTL: Duration = Duration::minutes(10);

/// What a one-time token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Verification,
    Reset,
}

impl TokenPurpose {
    pub fn invalid_message(self) -> &'static str {
        match self {
            TokenPurpose::Verification => "Invalid token",
            TokenPurpose::Reset => "Invalid reset token",
        }
    }

    pub fn expired_message(self) -> &'static str {
        match self {
            TokenPurpose::Verification => "Token expired",
            TokenPurpose::Reset => "Reset token expired",
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Six decimal digits, uniform over 100000..=999999.
pub fn generate_token() -> String {
    OsRng.gen_range(100_000..=999_999u32).to_string()
}

pub fn expiration_from(now: OffsetDateTime) -> OffsetDateTime {
    now + TOKEN_TTL
}

/// A token is still good at the exact instant it expires.
pub fn is_expired(expiration: OffsetDateTime, now: OffsetDateTime) -> bool {
    now > expiration
}

/// Greeting name taken from the address: "jane.doe@x.com" -> "Jane".
pub fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let first = local.split('.').next().unwrap_or_default();
    let mut chars = first.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn tokens_are_six_digits_in_range() {
        for _ in 0..1_000 {
            let token = generate_token();
            assert_eq!(token.len(), 6);
            let n: u32 = token.parse().expect("numeric token");
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn expiration_is_ten_minutes_out() {
        let now = datetime!(2024-05-01 12:00 UTC);
        assert_eq!(expiration_from(now), datetime!(2024-05-01 12:10 UTC));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let exp = datetime!(2024-05-01 12:10 UTC);
        assert!(!is_expired(exp, datetime!(2024-05-01 12:09:59 UTC)));
        assert!(!is_expired(exp, exp));
        assert!(is_expired(exp, exp + Duration::nanoseconds(1)));
    }

    #[test]
    fn display_name_capitalizes_first_segment() {
        assert_eq!(display_name("jane.doe@example.com"), "Jane");
        assert_eq!(display_name("BOB@example.com"), "Bob");
        assert_eq!(display_name("a@x.com"), "A");
        assert_eq!(display_name(".hidden@x.com"), "");
        assert_eq!(display_name("no-at-sign"), "No-at-sign");
    }

    #[test]
    fn purpose_messages_differ() {
        assert_eq!(TokenPurpose::Verification.invalid_message(), "Invalid token");
        assert_eq!(TokenPurpose::Reset.expired_message(), "Reset token expired");
    }
}

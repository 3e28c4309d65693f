//! One-time verification codes for the admin login flow.
//!
//! Time is passed in explicitly so expiry behavior is unit-testable; the
//! caller persists the challenge and emails the code.

use chrono::{DateTime, Duration, Utc};

/// An active verification challenge bound to an admin account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Exactly six decimal digits.
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Draws a fresh 6-digit code, valid for `ttl_minutes` from `now`.
/// Any previous challenge is superseded by persisting this one.
#[must_use]
pub fn generate_challenge(now: DateTime<Utc>, ttl_minutes: i64) -> Challenge {
    use rand::Rng;

    let code: u32 = rand::rng().random_range(100_000..=999_999);

    Challenge {
        code: code.to_string(),
        expires_at: now + Duration::minutes(ttl_minutes),
    }
}

/// Boolean predicate: false when there is no challenge, the challenge has
/// expired, or the candidate does not match exactly. Never an error, so a
/// caller cannot distinguish wrong from expired.
#[must_use]
pub fn verify(challenge: Option<&Challenge>, candidate: &str, now: DateTime<Utc>) -> bool {
    let Some(challenge) = challenge else {
        return false;
    };

    if now > challenge.expires_at {
        return false;
    }

    challenge.code == candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-08-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..100 {
            let challenge = generate_challenge(fixed_now(), 10);
            assert_eq!(challenge.code.len(), 6);
            assert!(challenge.code.chars().all(|c| c.is_ascii_digit()));
            assert!(!challenge.code.starts_with('0'));
        }
    }

    #[test]
    fn test_expiry_is_ttl_from_now() {
        let now = fixed_now();
        let challenge = generate_challenge(now, 10);
        assert_eq!(challenge.expires_at, now + Duration::minutes(10));
    }

    #[test]
    fn test_verify_accepts_matching_code_before_expiry() {
        let now = fixed_now();
        let challenge = generate_challenge(now, 10);
        assert!(verify(
            Some(&challenge),
            &challenge.code,
            now + Duration::minutes(9)
        ));
    }

    #[test]
    fn test_verify_rejects_after_expiry() {
        let now = fixed_now();
        let challenge = generate_challenge(now, 10);
        assert!(!verify(
            Some(&challenge),
            &challenge.code,
            now + Duration::minutes(10) + Duration::seconds(1)
        ));
    }

    #[test]
    fn test_verify_rejects_without_challenge() {
        assert!(!verify(None, "123456", fixed_now()));
    }

    #[test]
    fn test_verify_rejects_wrong_code() {
        let now = fixed_now();
        let challenge = Challenge {
            code: "123456".to_string(),
            expires_at: now + Duration::minutes(10),
        };
        assert!(!verify(Some(&challenge), "654321", now));
        assert!(!verify(Some(&challenge), "12345", now));
        assert!(!verify(Some(&challenge), "", now));
    }
}

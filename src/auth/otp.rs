use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use time::{Duration, OffsetDateTime};
use tracing::debug;

struct OtpEntry {
    code: String,
    issued_at: OffsetDateTime,
}

/// Pending signup codes, at most one live code per identifier.
///
/// Entries expire after the configured TTL; stale entries are dropped
/// lazily when the identifier is touched again.
pub struct OtpStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Generate a fresh 6-digit code, replacing any prior code for the identifier.
    pub fn issue(&self, identifier: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        entries.insert(
            identifier.to_string(),
            OtpEntry {
                code: code.clone(),
                issued_at: OffsetDateTime::now_utc(),
            },
        );
        debug!(%identifier, "otp issued");
        code
    }

    /// True iff a live code exists for the identifier and matches exactly.
    ///
    /// Unknown identifier, expired entry and mismatch are indistinguishable
    /// to the caller. Does not consume the code.
    pub fn verify(&self, identifier: &str, code: &str) -> bool {
        let mut entries = self.entries.lock().expect("otp store lock poisoned");
        Self::drop_if_expired(&mut entries, identifier, self.ttl);
        entries
            .get(identifier)
            .map(|entry| entry.code == code)
            .unwrap_or(false)
    }

    /// Remove the code after a successful registration to prevent replay.
    pub fn consume(&self, identifier: &str) {
        self.entries
            .lock()
            .expect("otp store lock poisoned")
            .remove(identifier);
    }

    fn drop_if_expired(entries: &mut HashMap<String, OtpEntry>, identifier: &str, ttl: Duration) {
        let stale = entries
            .get(identifier)
            .is_some_and(|entry| OffsetDateTime::now_utc() - entry.issued_at > ttl);
        if stale {
            entries.remove(identifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> OtpStore {
        OtpStore::new(Duration::minutes(5))
    }

    #[test]
    fn issued_code_verifies() {
        let store = store();
        let code = store.issue("a@x.com");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert!(store.verify("a@x.com", &code));
    }

    #[test]
    fn wrong_code_and_unknown_identifier_fail() {
        let store = store();
        store.issue("a@x.com");
        assert!(!store.verify("a@x.com", "000000x"));
        assert!(!store.verify("nobody@x.com", "123456"));
    }

    #[test]
    fn verify_does_not_consume() {
        let store = store();
        let code = store.issue("9999999999");
        assert!(store.verify("9999999999", &code));
        assert!(store.verify("9999999999", &code));
    }

    #[test]
    fn consume_removes_the_code() {
        let store = store();
        let code = store.issue("a@x.com");
        store.consume("a@x.com");
        assert!(!store.verify("a@x.com", &code));
    }

    #[test]
    fn reissue_overwrites_prior_code() {
        let store = store();
        let first = store.issue("a@x.com");
        let second = store.issue("a@x.com");
        if first != second {
            assert!(!store.verify("a@x.com", &first));
        }
        assert!(store.verify("a@x.com", &second));
    }

    #[test]
    fn expired_code_fails_verification() {
        let store = OtpStore::new(Duration::ZERO);
        let code = store.issue("a@x.com");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(!store.verify("a@x.com", &code));
    }
}

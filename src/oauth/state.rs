//! Login state tokens.
//!
//! A state token is generated immediately before the user is sent to the
//! authorize endpoint and compared exactly once when the callback returns.

use rand::Rng;
use subtle::ConstantTimeEq;

use super::OAuthError;
use crate::storage::Session;

/// Characters a state token is drawn from.
const STATE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// State token length in characters.
pub const STATE_LENGTH: usize = 16;

/// Generate a fresh state token.
///
/// Every call is independent; two tokens are equal only by chance
/// (62^16 possibilities).
#[must_use]
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .map(|_| STATE_CHARS[rng.random_range(0..STATE_CHARS.len())] as char)
        .collect()
}

/// Compare a returned state against the stored one in constant time.
///
/// A missing stored state never matches, not even a missing returned one.
#[must_use]
pub fn states_match(stored: Option<&str>, returned: Option<&str>) -> bool {
    match (stored, returned) {
        (Some(stored), Some(returned)) => stored.as_bytes().ct_eq(returned.as_bytes()).into(),
        _ => false,
    }
}

/// Generates state tokens and records them in the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateGenerator;

impl StateGenerator {
    /// Generate a token and store it in session-scoped storage, replacing
    /// any token left by an earlier unfinished login.
    pub fn issue(&self, session: &Session) -> Result<String, OAuthError> {
        let state = generate_state();
        session.store_state(&state)?;
        Ok(state)
    }
}

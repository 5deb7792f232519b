//! OTP challenge lifecycle: `Issued -> {Verified, Expired}`, plus the
//! terminal `Invalidated` (superseded by a resend) and `Exhausted`
//! (too many wrong codes) states.

use chrono::{DateTime, Utc};

use crate::common::utils::hash_otp_code;
use crate::domains::auth::models::OtpChallenge;

pub const OTP_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    Issued,
    Verified,
    Invalidated,
    Expired,
    Exhausted,
}

impl ChallengeState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChallengeState::Issued)
    }
}

/// What to do with a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDecision {
    /// Code matches an open challenge; consume it.
    Consume,
    /// Open challenge, wrong code; count the attempt.
    WrongCode,
    /// Challenge can no longer be verified.
    Closed(ChallengeState),
}

impl OtpChallenge {
    pub fn state(&self, now: DateTime<Utc>, max_attempts: i32) -> ChallengeState {
        if self.consumed_at.is_some() {
            ChallengeState::Verified
        } else if self.invalidated_at.is_some() {
            ChallengeState::Invalidated
        } else if now >= self.expires_at {
            ChallengeState::Expired
        } else if self.attempts >= max_attempts {
            ChallengeState::Exhausted
        } else {
            ChallengeState::Issued
        }
    }

    pub fn decide(&self, code: &str, now: DateTime<Utc>, max_attempts: i32) -> VerifyDecision {
        let state = self.state(now, max_attempts);
        if !state.is_open() {
            return VerifyDecision::Closed(state);
        }
        if hash_otp_code(self.id.as_uuid(), code) == self.code_hash {
            VerifyDecision::Consume
        } else {
            VerifyDecision::WrongCode
        }
    }
}

/// Exactly six ASCII digits.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == OTP_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

pub fn generate_code() -> String {
    use rand::Rng;
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

use bcrypt::{hash, verify};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]").expect("special character regex is valid"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),
    #[error("Password must be no more than {0} characters long")]
    TooLong(usize),
    #[error("Password must contain at least one letter")]
    NoLetter,
    #[error("Password must contain at least one number")]
    NoNumber,
    #[error("Failed to hash password")]
    HashingFailed,
    #[error("Failed to verify password")]
    VerificationFailed,
}

impl PasswordError {
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            PasswordError::TooShort(_)
                | PasswordError::TooLong(_)
                | PasswordError::NoLetter
                | PasswordError::NoNumber
        )
    }

    pub fn message_de(&self) -> String {
        match self {
            PasswordError::TooShort(min) => {
                format!("Das Passwort muss mindestens {min} Zeichen lang sein.")
            }
            PasswordError::TooLong(max) => {
                format!("Das Passwort darf höchstens {max} Zeichen lang sein.")
            }
            PasswordError::NoLetter => "Das Passwort muss mindestens einen Buchstaben enthalten.".to_string(),
            PasswordError::NoNumber => "Das Passwort muss mindestens eine Ziffer enthalten.".to_string(),
            PasswordError::HashingFailed | PasswordError::VerificationFailed => {
                "Das Passwort konnte nicht verarbeitet werden.".to_string()
            }
        }
    }
}

/// Password strength requirements. Kept deliberately gentle: no mandatory
/// upper case or special characters.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_number: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: true,
            require_number: true,
        }
    }
}

/// Validate password strength according to policy
pub fn validate_password_strength(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < policy.min_length {
        return Err(PasswordError::TooShort(policy.min_length));
    }

    if length > policy.max_length {
        return Err(PasswordError::TooLong(policy.max_length));
    }

    if policy.require_letter && !password.chars().any(char::is_alphabetic) {
        return Err(PasswordError::NoLetter);
    }

    if policy.require_number && !password.chars().any(char::is_numeric) {
        return Err(PasswordError::NoNumber);
    }

    Ok(())
}

/// Validate against the default policy, then hash with bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    validate_password_strength(password, &PasswordPolicy::default())?;

    hash(password, cost).map_err(|_| PasswordError::HashingFailed)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
}

/// Random alphanumeric token, used for CSRF tokens.
pub fn generate_token(len: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";

    let mut rng = rand::thread_rng();

    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Check password strength and return a score (0-100)
pub fn calculate_password_strength(password: &str) -> u8 {
    let mut score: u8 = match password.chars().count() {
        0..=7 => 0,
        8..=11 => 25,
        12..=15 => 35,
        _ => 45,
    };

    if password.chars().any(char::is_lowercase) {
        score += 10;
    }
    if password.chars().any(char::is_uppercase) {
        score += 10;
    }
    if password.chars().any(char::is_numeric) {
        score += 10;
    }
    if SPECIAL_CHARS.is_match(password) {
        score += 15;
    }

    let unique_chars = password.chars().collect::<std::collections::HashSet<_>>().len();
    if unique_chars >= 8 {
        score += 10;
    }

    let lowered = password.to_lowercase();
    if lowered.contains("passwort") || lowered.contains("password") || lowered.contains("123456") {
        score = score.saturating_sub(30);
    }

    score.min(100)
}

use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Hex SHA-256 of the password, the form the credential is stored in.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    password_digest(password).eq_ignore_ascii_case(digest)
}

pub fn sanitize_roll_number(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

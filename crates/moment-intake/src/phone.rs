//! Phone number canonicalization.
//!
//! Submitters type numbers in whatever shape they like; everything hashes
//! against the same canonical E.164 form so `(555) 123-4567` and
//! `+15551234567` group together.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number is not in a recognized format")]
    InvalidFormat,
}

/// Canonicalize a phone number to strict E.164: `+` followed by 1–15 digits,
/// first digit non-zero.
///
/// Accepted input shapes:
/// - bare 10-digit US number (`5551234567`, `(555) 123-4567`)
/// - 11 digits with a leading `1` country code
/// - already `+`-prefixed E.164
pub fn normalize_phone(raw: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    // Reject anything carrying characters beyond digits and common
    // formatting punctuation.
    let junk = trimmed
        .chars()
        .any(|c| !c.is_ascii_digit() && !matches!(c, '+' | '-' | '.' | '(' | ')' | ' '));
    if junk || digits.is_empty() {
        return Err(PhoneError::InvalidFormat);
    }

    let canonical = if has_plus {
        digits
    } else if digits.len() == 10 {
        format!("1{digits}")
    } else if digits.len() == 11 && digits.starts_with('1') {
        digits
    } else {
        return Err(PhoneError::InvalidFormat);
    };

    if canonical.len() > 15 || canonical.starts_with('0') {
        return Err(PhoneError::InvalidFormat);
    }

    Ok(format!("+{canonical}"))
}

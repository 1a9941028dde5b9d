// --- File: crates/reservo_booking/src/validation.rs ---
//! Field checks applied before a reservation reaches the ledger.

use chrono::NaiveDate;
use reservo_common::{validation_error, ReservoError};

pub fn parse_date(value: &str) -> Result<NaiveDate, ReservoError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| validation_error("Invalid date format (YYYY-MM-DD)"))
}

/// Letters (any script), spaces and `.'-`; at least one letter.
pub fn validate_guest_name(name: &str) -> Result<String, ReservoError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(validation_error("Guest name is required"));
    }
    if name.chars().count() > 100 {
        return Err(validation_error("Guest name is too long"));
    }
    let allowed = |c: char| c.is_alphabetic() || c == ' ' || c == '.' || c == '\'' || c == '-' || is_combining_mark(c);
    if !name.chars().all(allowed) || !name.chars().any(char::is_alphabetic) {
        return Err(validation_error("Guest name may only contain letters"));
    }
    Ok(name.to_string())
}

// Thai vowel and tone marks are not `alphabetic` on their own.
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}')
}

/// 9 to 15 digits, optional leading `+`; spaces and dashes are dropped.
pub fn validate_phone(phone: &str) -> Result<String, ReservoError> {
    let trimmed = phone.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' => {}
            _ => return Err(validation_error("Phone number may only contain digits")),
        }
    }
    if !(9..=15).contains(&digits.len()) {
        return Err(validation_error("Phone number must have 9 to 15 digits"));
    }
    Ok(format!("{plus}{digits}"))
}

pub fn validate_email(email: Option<&str>) -> Result<Option<String>, ReservoError> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(validation_error("Invalid email address"));
    }
    Ok(Some(email.to_string()))
}

pub fn validate_party_size(party_size: u32, max_party_size: u32) -> Result<u32, ReservoError> {
    if party_size == 0 || party_size > max_party_size {
        return Err(validation_error(format!(
            "Party size must be between 1 and {max_party_size}"
        )));
    }
    Ok(party_size)
}

pub fn validate_session_id(session_id: &str) -> Result<&str, ReservoError> {
    let session_id = session_id.trim();
    if session_id.is_empty() || session_id.len() > 128 {
        return Err(validation_error("sessionId is required"));
    }
    Ok(session_id)
}

/// Empty strings from form inputs become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

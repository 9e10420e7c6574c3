//! Albanian phone number validation.
//!
//! Checkout, registration and addresses all take an Albanian phone number.
//! The national significant number must start with `4` (Tirana landline,
//! 8 digits) or `6` (mobile, 9 digits, `66`-`69`). Input is accepted with
//! `+355`, `00355`, `355` or a trunk `0`, and may contain spaces, dashes, dots
//! and parentheses.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Albania's country calling code.
pub const COUNTRY_CODE: &str = "355";

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^6[6-9]\d{7}$").expect("Invalid regex"));
static LANDLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^4\d{7}$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number contains invalid characters")]
    InvalidCharacter,
    #[error("only Albanian (+355) numbers are accepted")]
    ForeignCountryCode,
    #[error("Albanian numbers must start with 4 or 6")]
    InvalidPrefix,
    #[error("phone number has the wrong length")]
    InvalidLength,
}

impl PhoneError {
    /// Message shown next to the form field.
    #[must_use]
    pub const fn message_sq(&self) -> &'static str {
        match self {
            Self::Empty => "Numri i telefonit është i detyrueshëm",
            Self::InvalidPrefix => "Numri duhet të fillojë me 4 ose 6",
            Self::ForeignCountryCode => "Pranohen vetëm numra shqiptarë (+355)",
            Self::InvalidCharacter | Self::InvalidLength => {
                "Numri i telefonit nuk është i vlefshëm"
            }
        }
    }
}

/// Kind of Albanian number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneKind {
    Mobile,
    Landline,
}

/// A validated Albanian phone number, stored in E.164 form (`+355691234567`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalise an Albanian phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the input is empty, has non-digit
    /// characters, a foreign country code, a national number not starting
    /// with 4 or 6, or the wrong length.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let compact: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')' | '\u{a0}'))
            .collect();
        if compact.is_empty() {
            return Err(PhoneError::Empty);
        }

        let national = if let Some(rest) = compact.strip_prefix('+') {
            rest.strip_prefix(COUNTRY_CODE)
                .ok_or(PhoneError::ForeignCountryCode)?
        } else if let Some(rest) = compact.strip_prefix("00") {
            rest.strip_prefix(COUNTRY_CODE)
                .ok_or(PhoneError::ForeignCountryCode)?
        } else if let Some(rest) = compact.strip_prefix(COUNTRY_CODE) {
            rest
        } else if let Some(rest) = compact.strip_prefix('0') {
            rest
        } else {
            compact.as_str()
        };

        if national.is_empty() {
            return Err(PhoneError::InvalidLength);
        }
        if !national.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacter);
        }
        if !national.starts_with(['4', '6']) {
            return Err(PhoneError::InvalidPrefix);
        }
        if !MOBILE.is_match(national) && !LANDLINE.is_match(national) {
            return Err(PhoneError::InvalidLength);
        }

        Ok(Self(format!("+{COUNTRY_CODE}{national}")))
    }

    /// E.164 form, e.g. `+355691234567`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// National significant number without country code or trunk prefix.
    #[must_use]
    pub fn national_digits(&self) -> &str {
        self.0.get(1 + COUNTRY_CODE.len()..).unwrap_or("")
    }

    #[must_use]
    pub fn kind(&self) -> PhoneKind {
        if self.national_digits().starts_with('6') {
            PhoneKind::Mobile
        } else {
            PhoneKind::Landline
        }
    }

    /// National display form: `069 123 4567` or `04 123 4567`.
    #[must_use]
    pub fn national(&self) -> String {
        let n = self.national_digits();
        let split = match self.kind() {
            PhoneKind::Mobile => 2,
            PhoneKind::Landline => 1,
        };
        let (area, rest) = n.split_at(split.min(n.len()));
        let (mid, tail) = rest.split_at(3.min(rest.len()));
        format!("0{area} {mid} {tail}")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_mobile_formats() {
        for input in [
            "069 123 4567",
            "0691234567",
            "+355 69 123 4567",
            "00355691234567",
            "355691234567",
            "69-123-4567",
            "(069) 123.4567",
        ] {
            let phone = PhoneNumber::parse(input).unwrap();
            assert_eq!(phone.as_str(), "+355691234567", "input: {input}");
            assert_eq!(phone.kind(), PhoneKind::Mobile);
        }
    }

    #[test]
    fn test_accepts_tirana_landline() {
        let phone = PhoneNumber::parse("04 222 3333").unwrap();
        assert_eq!(phone.as_str(), "+35542223333");
        assert_eq!(phone.kind(), PhoneKind::Landline);
        assert_eq!(phone.national(), "04 222 3333");
    }

    #[test]
    fn test_rejects_numbers_not_starting_with_4_or_6() {
        for input in ["0521234567", "+355 52 123 456", "789123456", "0312345678"] {
            assert_eq!(
                PhoneNumber::parse(input),
                Err(PhoneError::InvalidPrefix),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("06912345"),
            Err(PhoneError::InvalidLength)
        );
        assert_eq!(
            PhoneNumber::parse("069123456789"),
            Err(PhoneError::InvalidLength)
        );
        // 65 is not an allocated mobile range.
        assert_eq!(
            PhoneNumber::parse("0651234567"),
            Err(PhoneError::InvalidLength)
        );
        assert_eq!(PhoneNumber::parse("+355"), Err(PhoneError::InvalidLength));
    }

    #[test]
    fn test_rejects_other_input() {
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("069abc4567"),
            Err(PhoneError::InvalidCharacter)
        );
        assert_eq!(
            PhoneNumber::parse("+39 333 1234567"),
            Err(PhoneError::ForeignCountryCode)
        );
    }

    #[test]
    fn test_national_display() {
        let phone = PhoneNumber::parse("+355691234567").unwrap();
        assert_eq!(phone.national(), "069 123 4567");
    }

    #[test]
    fn test_albanian_messages() {
        assert_eq!(
            PhoneError::InvalidPrefix.message_sq(),
            "Numri duhet të fillojë me 4 ose 6"
        );
    }
}

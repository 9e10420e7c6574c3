//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain has no dot or an empty label.
    #[error("email domain is invalid")]
    InvalidDomain,
    /// The address contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
}

impl EmailError {
    /// Message shown next to the form field.
    #[must_use]
    pub const fn message_sq(&self) -> &'static str {
        match self {
            Self::Empty => "Email-i është i detyrueshëm",
            _ => "Email-i nuk është i vlefshëm",
        }
    }
}

/// An email address.
///
/// Surrounding whitespace is trimmed and the domain is lower-cased, so the
/// value sent to the backend is the same one the customer will log in with.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit)
/// - Exactly one @ symbol, no inner whitespace
/// - Local part (before @) must not be empty
/// - Domain must contain a dot and no empty labels
///
/// ## Examples
///
/// ```
/// use lodra_core::Email;
///
/// assert_eq!(Email::parse(" Ana@Lodra.AL ").unwrap().as_str(), "Ana@lodra.al");
/// assert!(Email::parse("ana@localhost").is_err());
/// assert!(Email::parse("ana@@lodra.al").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first violated constraint.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::AtSymbol);
        };

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("ana@lodra.al").is_ok());
        assert!(Email::parse("ana.hoxha+lodra@gmail.com").is_ok());
        assert!(Email::parse("a@b.co").is_ok());
    }

    #[test]
    fn test_parse_trims_and_lowercases_domain() {
        let email = Email::parse("  Ana@Lodra.AL\n").unwrap();
        assert_eq!(email.as_str(), "Ana@lodra.al");
        assert_eq!(email.domain(), "lodra.al");
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.al"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@lodra.al"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("ana@lodra"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("ana@lodra..al"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("an a@lodra.al"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@lodra.al", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_albanian_messages() {
        assert_eq!(EmailError::Empty.message_sq(), "Email-i është i detyrueshëm");
        assert_eq!(
            EmailError::InvalidDomain.message_sq(),
            "Email-i nuk është i vlefshëm"
        );
    }

    #[test]
    fn test_serde_is_transparent() {
        let email = Email::parse("ana@lodra.al").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ana@lodra.al\"");
    }
}

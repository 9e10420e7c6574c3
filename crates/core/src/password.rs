//! Password strength scoring for the registration form.
//!
//! Scores come from [`zxcvbn`] and run from 0 (too guessable) to 4 (very
//! unguessable), the same scale the strength bar on the form shows.
//! Registration needs at least [`MIN_ACCEPTED_SCORE`].

use serde::Serialize;

/// Minimum password length. Shorter passwords score 0.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowest score the registration form accepts.
pub const MIN_ACCEPTED_SCORE: u8 = 2;

/// Result of scoring a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    /// 0 to 4.
    pub score: u8,
}

impl PasswordStrength {
    /// Whether registration accepts this password.
    #[must_use]
    pub const fn is_acceptable(&self) -> bool {
        self.score >= MIN_ACCEPTED_SCORE
    }

    /// Albanian label for the strength bar.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.score {
            0 => "Shumë i dobët",
            1 => "I dobët",
            2 => "Mesatar",
            3 => "I mirë",
            _ => "I fortë",
        }
    }
}

/// Score a password from 0 to 4.
///
/// `user_inputs` are words the password should not lean on, such as the
/// customer's name or email.
#[must_use]
pub fn score_password(password: &str, user_inputs: &[&str]) -> PasswordStrength {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return PasswordStrength { score: 0 };
    }
    let inputs: Vec<&str> = user_inputs
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let score = zxcvbn::zxcvbn(password, &inputs).score() as u8;
    PasswordStrength { score: score.min(4) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_passwords_score_zero() {
        assert_eq!(score_password("", &[]).score, 0);
        assert_eq!(score_password("Ab1!", &[]).score, 0);
    }

    #[test]
    fn test_common_passwords_are_rejected() {
        for password in ["password", "12345678", "qwertyuiop", "aaaaaaaaaaaa"] {
            assert!(!score_password(password, &[]).is_acceptable(), "{password}");
        }
    }

    #[test]
    fn test_long_random_password_is_strong() {
        let strength = score_password("Kamion-Blu-Zjarri-84!", &[]);
        assert_eq!(strength.score, 4);
        assert!(strength.is_acceptable());
    }

    #[test]
    fn test_user_inputs_lower_the_score() {
        let plain = score_password("AnaHoxha1990", &[]);
        let personal = score_password("AnaHoxha1990", &["Ana", "Hoxha", " "]);
        assert!(personal.score <= plain.score);
    }

    #[test]
    fn test_labels() {
        assert_eq!(score_password("x", &[]).label(), "Shumë i dobët");
        assert_eq!(score_password("Kamion-Blu-Zjarri-84!", &[]).label(), "I fortë");
    }
}

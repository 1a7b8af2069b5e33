use crate::models::IdentificationType;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    NifFormat,
    AccountFormat,
    MobileFormat,
    TooShort,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NifFormat => {
                write!(f, "O NIF deve ter exatamente 7 dígitos.")
            }
            ValidationError::AccountFormat => {
                write!(f, "O número de conta deve ter entre 6 e 12 dígitos.")
            }
            ValidationError::MobileFormat => {
                write!(f, "O número de telemóvel deve ter exatamente 7 dígitos.")
            }
            ValidationError::TooShort => {
                write!(
                    f,
                    "O formato introduzido parece incorreto. Por favor, tente novamente."
                )
            }
        }
    }
}

/// Checks a raw identification value against the per-type format rules.
/// Input is trimmed before testing. There is no retry limit; the caller
/// re-prompts on every failure.
pub fn validate_identification(
    id_type: Option<&IdentificationType>,
    raw: &str,
) -> Result<(), ValidationError> {
    let value = raw.trim();
    match id_type {
        Some(IdentificationType::Nif) => {
            if is_digits(value) && value.len() == 7 {
                Ok(())
            } else {
                Err(ValidationError::NifFormat)
            }
        }
        Some(IdentificationType::Account) => {
            if is_digits(value) && (6..=12).contains(&value.len()) {
                Ok(())
            } else {
                Err(ValidationError::AccountFormat)
            }
        }
        Some(IdentificationType::Mobile) => {
            if is_digits(value) && value.len() == 7 {
                Ok(())
            } else {
                Err(ValidationError::MobileFormat)
            }
        }
        None => {
            if value.chars().count() >= 3 {
                Ok(())
            } else {
                Err(ValidationError::TooShort)
            }
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentificationType::*;

    #[test]
    fn nif_requires_exactly_seven_digits() {
        assert!(validate_identification(Some(&Nif), "1234567").is_ok());
        assert!(validate_identification(Some(&Nif), " 1234567 ").is_ok());
        assert_eq!(
            validate_identification(Some(&Nif), "123456"),
            Err(ValidationError::NifFormat)
        );
        assert_eq!(
            validate_identification(Some(&Nif), "12345678"),
            Err(ValidationError::NifFormat)
        );
        assert_eq!(
            validate_identification(Some(&Nif), "12345a7"),
            Err(ValidationError::NifFormat)
        );
    }

    #[test]
    fn account_accepts_six_to_twelve_digits() {
        assert!(validate_identification(Some(&Account), "123456").is_ok());
        assert!(validate_identification(Some(&Account), "123456789012").is_ok());
        assert_eq!(
            validate_identification(Some(&Account), "12345"),
            Err(ValidationError::AccountFormat)
        );
        assert_eq!(
            validate_identification(Some(&Account), "1234567890123"),
            Err(ValidationError::AccountFormat)
        );
    }

    #[test]
    fn mobile_requires_exactly_seven_digits() {
        assert!(validate_identification(Some(&Mobile), "9911234").is_ok());
        assert_eq!(
            validate_identification(Some(&Mobile), "991123"),
            Err(ValidationError::MobileFormat)
        );
        assert_eq!(
            validate_identification(Some(&Mobile), "99112345"),
            Err(ValidationError::MobileFormat)
        );
    }

    #[test]
    fn unknown_type_needs_three_characters() {
        assert!(validate_identification(None, "abc").is_ok());
        assert_eq!(
            validate_identification(None, "ab"),
            Err(ValidationError::TooShort)
        );
        assert_eq!(
            validate_identification(None, "  a  "),
            Err(ValidationError::TooShort)
        );
    }

    #[test]
    fn messages_are_type_specific() {
        assert!(ValidationError::NifFormat.to_string().contains("NIF"));
        assert!(ValidationError::AccountFormat.to_string().contains("conta"));
        assert!(ValidationError::MobileFormat
            .to_string()
            .contains("telemóvel"));
    }
}

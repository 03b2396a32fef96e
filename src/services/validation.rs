//! Credential validation for account setup

use crate::services::source::{AccountSource, Credentials};
use crate::types::{HypermonError, Result, SourceError};

/// Check that `credentials` are usable and return the entry title.
///
/// Obviously bad input is rejected locally; otherwise the source is asked
/// for the customer record, mapping a rejection to [`HypermonError::InvalidAuth`]
/// and any other failure to [`HypermonError::CannotConnect`].
pub fn validate_input<S: AccountSource + ?Sized>(
    source: &S,
    credentials: &Credentials,
) -> Result<String> {
    let email = credentials.email.trim();
    if email.is_empty() || !email.contains('@') || credentials.password.is_empty() {
        return Err(HypermonError::InvalidAuth);
    }

    match source.get_customer() {
        Ok(customer) => Ok(format!("Hyperoptic - {}", customer.full_name)),
        Err(SourceError::Unauthorized) => Err(HypermonError::InvalidAuth),
        Err(err) => {
            tracing::error!("Error validating credentials: {}", err);
            Err(HypermonError::CannotConnect(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::coordinator::tests::StaticSource;

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_credentials_return_title() {
        let title = validate_input(&StaticSource::ok(), &creds("diana@example.com", "pw")).unwrap();
        assert_eq!(title, "Hyperoptic - Diana Williams");
    }

    #[test]
    fn test_malformed_email_rejected_locally() {
        let source = StaticSource::ok();
        let result = validate_input(&source, &creds("not-an-email", "pw"));
        assert!(matches!(result, Err(HypermonError::InvalidAuth)));
        assert_eq!(source.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = validate_input(&StaticSource::ok(), &creds("diana@example.com", ""));
        assert!(matches!(result, Err(HypermonError::InvalidAuth)));
    }

    #[test]
    fn test_unauthorized_is_invalid_auth() {
        let source = StaticSource::failing(|| SourceError::Unauthorized);
        let result = validate_input(&source, &creds("diana@example.com", "wrong"));
        assert!(matches!(result, Err(HypermonError::InvalidAuth)));
    }

    #[test]
    fn test_unavailable_is_cannot_connect() {
        let source = StaticSource::failing(|| SourceError::Unavailable("timeout".to_string()));
        let result = validate_input(&source, &creds("diana@example.com", "pw"));
        assert!(matches!(result, Err(HypermonError::CannotConnect(_))));
    }
}

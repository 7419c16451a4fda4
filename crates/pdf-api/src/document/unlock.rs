//! Decryption operation: remove password protection from a document.

use common::ServiceError;
use tracing::info;

use crate::pdf::{BackendError, Decryptor, Protection};

/// Remove the password from `document`.
///
/// The document is first checked for whether it opens without a password at
/// all; only a document that needs one is then opened with `password`.
///
/// # Errors
///
/// - [`ServiceError::NoPassword`] if the document opens without a password.
/// - [`ServiceError::WrongPassword`] if `password` does not open it.
/// - [`ServiceError::Processing`] for malformed documents or library failures.
pub fn remove_password(
    decryptor: &dyn Decryptor,
    document: &[u8],
    password: &str,
) -> Result<Vec<u8>, ServiceError> {
    match decryptor.protection(document) {
        Ok(Protection::Open) => {
            info!("document is not password protected");
            return Err(ServiceError::NoPassword);
        }
        Ok(Protection::PasswordRequired) => {}
        Err(e) => return Err(processing("could not inspect document security", e)),
    }

    match decryptor.decrypt(document, password) {
        Ok(bytes) => Ok(bytes),
        Err(BackendError::WrongPassword) => Err(ServiceError::WrongPassword),
        Err(e) => Err(processing("could not decrypt document", e)),
    }
}

fn processing(message: &str, err: BackendError) -> ServiceError {
    ServiceError::processing(message, err.to_string())
}

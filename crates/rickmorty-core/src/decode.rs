//! JSON body decoding
//!
//! Turns a response body into a typed record. Unknown fields are ignored
//! by the record definitions in [`crate::types`].

use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};

/// Decode a JSON body into `T`.
///
/// # Arguments
/// * `body` - Raw response body
/// * `context` - Short description of what is decoded, used in the error
///
/// # Errors
/// `ApiError::Decode` if the body is not valid JSON for `T`
pub fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        context: context.to_string(),
        source,
    })
}

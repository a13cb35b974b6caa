//! Request / response bodies for the JSON API.
//!
//! Request types deny unknown fields and carry `validator` rules; handlers
//! take them through [`ValidatedJson`], so nothing malformed reaches a
//! service.

pub mod code;
pub mod user;

use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ServerError;

/// Maximum length, in characters, of submitted code or prompt text.
pub const MAX_TEXT_LEN: u64 = 128 * 1024;

/// JSON body that has been deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ServerError::BadRequest(first_message(&errors)))?;
        Ok(Self(value))
    }
}

/// The message of the first failing field, in field-name order.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .unwrap_or_else(|| "invalid request".to_owned())
}

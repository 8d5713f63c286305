//! Parameter extraction from the query string or the request body.
//!
//! Callers may send `?text=...` in the URL, a JSON object, or a urlencoded
//! form. The query string is tried first; the body is only read when the
//! query string does not bind.

use axum::extract::{FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A parameter set with one required field, named for error messages.
pub trait RequiredParam {
    /// Name of the required parameter.
    const NAME: &'static str;
}

/// Extractor binding `T` from the query string, a JSON body, or a form body.
#[derive(Debug)]
pub struct Params<T>(pub T);

impl<S, T> FromRequest<S> for Params<T>
where
    T: DeserializeOwned + RequiredParam + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(Query(value)) = Query::<T>::try_from_uri(req.uri()) {
            return Ok(Params(value));
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mime = content_type.split(';').next().unwrap_or_default().trim();

        if is_json(mime) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Params(value));
        }

        if mime == "application/x-www-form-urlencoded" {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return Ok(Params(value));
        }

        Err(ApiError::BadRequest(format!(
            "Parameter '{}' is required (query string, JSON body, or form body)",
            T::NAME
        )))
    }
}

/// `application/json` or any `application/*+json` subtype, as axum's `Json`
/// extractor accepts.
fn is_json(mime: &str) -> bool {
    mime == "application/json"
        || mime
            .strip_prefix("application/")
            .is_some_and(|subtype| subtype.ends_with("+json"))
}

//! services/api/src/web/validation.rs
//!
//! Request extractors that answer malformed input with a 400 envelope instead of
//! axum's plain-text rejections. JSON bodies are additionally checked against
//! their `validator` rules.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::web::envelope::Reply;

/// A JSON body that parsed and passed its field rules.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Reply<()>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Reply::invalid(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| Reply::invalid(field_messages(&errors)))?;
        Ok(Self(value))
    }
}

pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Reply<()>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Reply::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Reply<()>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Reply::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `field: message` pairs, sorted by field.
pub fn field_messages(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct Join {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate(length(min = 1, message = "must not be empty"))]
        password: String,
    }

    #[test]
    fn messages_name_every_failing_field() {
        let join = Join {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = join.validate().unwrap_err();
        assert_eq!(
            field_messages(&errors),
            "email: must be a valid email; password: must not be empty"
        );
    }
}

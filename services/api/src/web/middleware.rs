//! services/api/src/web/middleware.rs
//!
//! Bearer token authentication.
//!
//! Requests without an `Authorization` header pass through unauthenticated and
//! are turned away by the `Authenticated` extractor on protected handlers. A
//! header that is present must carry a valid token whose roles still resolve to
//! an existing account.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use solicare_core::access::Principal;
use std::sync::Arc;
use tracing::debug;

use crate::web::envelope::Reply;
use crate::web::state::AppState;

pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(header) = req.headers().get(AUTHORIZATION).cloned() else {
        return next.run(req).await;
    };

    match resolve_principal(&state, &header).await {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

async fn resolve_principal(state: &AppState, header: &HeaderValue) -> Result<Principal, Reply<()>> {
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Reply::unauthorized("Authorization header must use Bearer token format"))?;

    let claims = state.jwt.validate(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        Reply::unauthorized(e.to_string())
    })?;
    let subject = claims
        .subject()
        .map_err(|e| Reply::unauthorized(e.to_string()))?;

    let mut roles = Vec::new();
    for role in claims.roles() {
        let exists = state
            .services
            .identity
            .principal_exists(role, subject)
            .await
            .map_err(Reply::internal)?;
        if exists {
            roles.push(role);
        }
    }
    if roles.is_empty() {
        return Err(Reply::unauthorized("The token carries no valid role"));
    }
    Ok(Principal::new(subject, roles))
}

/// The principal established by [`authenticate`]. Rejects with 401 when absent.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Reply<()>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| Reply::unauthorized("A bearer token is required"))
    }
}

//! services/api/src/web/auth.rs
//!
//! Public endpoints for joining and logging in. Both account kinds receive a
//! bearer token carrying their role.

use axum::extract::State;
use solicare_core::services::identity::{MemberJoin, MemberLogin, SeniorJoin, SeniorLogin};
use std::sync::Arc;

use crate::web::dto::{
    MemberJoinRequest, MemberLoginRequest, MemberSession, SeniorJoinRequest, SeniorLoginRequest,
    SeniorSession,
};
use crate::web::envelope::ApiResult;
use crate::web::state::AppState;
use crate::web::validation::ValidJson;

/// POST /api/member/join - Create a member account
#[utoipa::path(
    post,
    path = "/api/member/join",
    tag = "Member",
    request_body = MemberJoinRequest,
    responses(
        (status = 201, description = "Member created", body = MemberSession),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email or phone number already taken")
    )
)]
pub async fn member_join_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<MemberJoinRequest>,
) -> ApiResult<MemberSession> {
    let join = MemberJoin {
        email: req.email,
        password: req.password,
        name: req.name,
        phone_number: req.phone_number,
    };
    let outcome = state.services.identity.join_member(join).await;
    Ok(outcome.map(MemberSession::from).into())
}

/// POST /api/member/login - Log in with email and password
#[utoipa::path(
    post,
    path = "/api/member/login",
    tag = "Member",
    request_body = MemberLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = MemberSession),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn member_login_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<MemberLoginRequest>,
) -> ApiResult<MemberSession> {
    let login = MemberLogin {
        email: req.email,
        password: req.password,
    };
    let outcome = state.services.identity.login_member(login).await;
    Ok(outcome.map(MemberSession::from).into())
}

/// POST /api/senior/join - Create a senior account
#[utoipa::path(
    post,
    path = "/api/senior/join",
    tag = "Senior",
    request_body = SeniorJoinRequest,
    responses(
        (status = 201, description = "Senior created", body = SeniorSession),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "User id or phone number already taken")
    )
)]
pub async fn senior_join_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SeniorJoinRequest>,
) -> ApiResult<SeniorSession> {
    let join = SeniorJoin {
        user_id: req.user_id,
        password: req.password,
        name: req.name,
        age: req.age,
        gender: req.gender,
        phone_number: req.phone_number,
        address: req.address,
        note: req.note,
    };
    let outcome = state.services.identity.join_senior(join).await;
    Ok(outcome.map(SeniorSession::from).into())
}

/// POST /api/senior/login - Log in with user id and password
#[utoipa::path(
    post,
    path = "/api/senior/login",
    tag = "Senior",
    request_body = SeniorLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SeniorSession),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Unknown user id")
    )
)]
pub async fn senior_login_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SeniorLoginRequest>,
) -> ApiResult<SeniorSession> {
    let login = SeniorLogin {
        user_id: req.user_id,
        password: req.password,
    };
    let outcome = state.services.identity.login_senior(login).await;
    Ok(outcome.map(SeniorSession::from).into())
}

//! services/api/src/web/member.rs
//!
//! Member profile and the seniors a member monitors.

use axum::extract::State;
use solicare_core::access;
use solicare_core::services::care::SeniorLink;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{all, MemberProfile, SeniorBrief, SeniorLinkRequest};
use crate::web::envelope::{require, ApiResult};
use crate::web::middleware::Authenticated;
use crate::web::state::AppState;
use crate::web::validation::{ValidJson, ValidPath};

/// GET /api/member/{uuid} - The member's own profile
#[utoipa::path(
    get,
    path = "/api/member/{uuid}",
    tag = "Member",
    params(("uuid" = Uuid, Path, description = "Member UUID")),
    responses(
        (status = 200, description = "Profile found", body = MemberProfile),
        (status = 403, description = "Not the member"),
        (status = 404, description = "Member not found")
    ),
    security(("bearer" = []))
)]
pub async fn member_profile_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(member_id): ValidPath<Uuid>,
) -> ApiResult<MemberProfile> {
    require(access::member_self(&principal, member_id))?;
    let outcome = state.services.identity.member_profile(member_id).await;
    Ok(outcome.map(MemberProfile::from).into())
}

/// GET /api/member/{uuid}/seniors - Seniors the member monitors, by name
#[utoipa::path(
    get,
    path = "/api/member/{uuid}/seniors",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Member UUID")),
    responses(
        (status = 200, description = "Linked seniors with their unread alert counts", body = [SeniorBrief]),
        (status = 403, description = "Not the member")
    ),
    security(("bearer" = []))
)]
pub async fn member_seniors_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(member_id): ValidPath<Uuid>,
) -> ApiResult<Vec<SeniorBrief>> {
    require(access::member_self(&principal, member_id))?;
    let outcome = state.services.care.query_seniors_by_member(member_id).await;
    Ok(outcome.map(all::<_, SeniorBrief>).into())
}

/// POST /api/member/{uuid}/seniors - Start monitoring a senior using their credentials
#[utoipa::path(
    post,
    path = "/api/member/{uuid}/seniors",
    tag = "Care",
    params(("uuid" = Uuid, Path, description = "Member UUID")),
    request_body = SeniorLinkRequest,
    responses(
        (status = 201, description = "Linked", body = SeniorBrief),
        (status = 401, description = "Wrong senior password"),
        (status = 404, description = "Member or senior not found"),
        (status = 409, description = "Already linked")
    ),
    security(("bearer" = []))
)]
pub async fn member_link_senior_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath(member_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<SeniorLinkRequest>,
) -> ApiResult<SeniorBrief> {
    require(access::member_self(&principal, member_id))?;
    let link = SeniorLink {
        user_id: req.user_id,
        password: req.password,
    };
    let outcome = state
        .services
        .care
        .link_senior_to_member(member_id, link)
        .await;
    Ok(outcome.map(SeniorBrief::from).into())
}

/// DELETE /api/member/{uuid}/seniors/{seniorUuid} - Stop monitoring a senior
#[utoipa::path(
    delete,
    path = "/api/member/{uuid}/seniors/{seniorUuid}",
    tag = "Care",
    params(
        ("uuid" = Uuid, Path, description = "Member UUID"),
        ("seniorUuid" = Uuid, Path, description = "Senior UUID")
    ),
    responses(
        (status = 403, description = "Not the member"),
        (status = 501, description = "Unlinking is not supported yet")
    ),
    security(("bearer" = []))
)]
pub async fn member_unlink_senior_handler(
    Authenticated(principal): Authenticated,
    State(state): State<Arc<AppState>>,
    ValidPath((member_id, senior_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    require(access::member_self(&principal, member_id))?;
    Ok(state.services.care.unlink(member_id, senior_id).await.into())
}

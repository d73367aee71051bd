//! Team roster routes under `/api/team-members`.
//!
//! Reading is open to every signed-in caller; creating and editing need
//! admin or manager; deactivating needs admin. A caller may link their own
//! account only to the active entry carrying their email.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use team_pulse_core::TeamMemberId;
use team_pulse_platform_access::{DEFAULT_WEEKLY_HOURS, Role, RosterWrite, TeamMember};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{AdminOnly, AdminOrManager, AppState, RequireAuth, RequireRole};
use crate::error::ApiError;

/// Routes mounted at `/api/team-members`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(deactivate))
        .route("/{id}/link-user", post(link_user))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamMemberRequest {
    #[validate(length(min = 1, max = 255))]
    name: String,
    #[validate(email)]
    email: String,
    role: Option<Role>,
    #[validate(range(min = 0, max = 168))]
    weekly_hours: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamMemberRequest {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    #[validate(email)]
    email: Option<String>,
    role: Option<Role>,
    #[validate(range(min = 0, max = 168))]
    weekly_hours: Option<i32>,
    is_active: Option<bool>,
}

impl UpdateTeamMemberRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.weekly_hours.is_none()
            && self.is_active.is_none()
    }

    fn apply(self, member: &mut TeamMember) {
        if let Some(name) = self.name {
            member.set_name(name);
        }
        if let Some(email) = self.email {
            member.set_email(email);
        }
        if let Some(role) = self.role {
            member.set_role(role);
        }
        if let Some(weekly_hours) = self.weekly_hours {
            member.set_weekly_hours(weekly_hours);
        }
        if let Some(is_active) = self.is_active {
            member.set_active(is_active);
        }
    }
}

fn parse_id(raw: &str) -> Result<TeamMemberId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid team member id"))
}

fn not_found() -> ApiError {
    ApiError::not_found("Team member not found")
}

fn written(outcome: RosterWrite) -> Result<TeamMember, ApiError> {
    match outcome {
        RosterWrite::Applied(member) => Ok(member),
        RosterWrite::NotFound => Err(not_found()),
        RosterWrite::EmailTaken => Err(ApiError::conflict("Email already exists")),
        RosterWrite::AccountTaken => Err(ApiError::conflict(
            "User is already linked to another team member",
        )),
    }
}

async fn list(
    State(state): State<Arc<AppState>>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
    let members = state
        .team_members
        .list_members(query.include_inactive)
        .await?;
    Ok(Json(members))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<TeamMember>, ApiError> {
    let id = parse_id(&id)?;
    let member = state
        .team_members
        .find_member(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(member))
}

async fn create(
    State(state): State<Arc<AppState>>,
    caller: RequireRole<AdminOrManager>,
    Json(body): Json<CreateTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let member = TeamMember::new(
        body.name,
        body.email,
        body.role.unwrap_or(Role::DEFAULT),
        body.weekly_hours.unwrap_or(DEFAULT_WEEKLY_HOURS),
    );
    let member = written(state.team_members.insert_member(&member).await?)?;
    info!(
        team_member_id = %member.id(),
        created_by = %caller.claims().sub,
        "team member created"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    _caller: RequireRole<AdminOrManager>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTeamMemberRequest>,
) -> Result<Json<TeamMember>, ApiError> {
    let id = parse_id(&id)?;
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    if body.is_empty() {
        return Err(ApiError::bad_request("No valid fields to update"));
    }

    let mut member = state
        .team_members
        .find_member(id)
        .await?
        .ok_or_else(not_found)?;
    body.apply(&mut member);

    let member = written(state.team_members.update_member(&member).await?)?;
    Ok(Json(member))
}

async fn deactivate(
    State(state): State<Arc<AppState>>,
    caller: RequireRole<AdminOnly>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if !state.team_members.deactivate(id).await? {
        return Err(not_found());
    }
    info!(
        team_member_id = %id,
        deactivated_by = %caller.claims().sub,
        "team member deactivated"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn link_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(claims): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<TeamMember>, ApiError> {
    let id = parse_id(&id)?;
    let member = state
        .team_members
        .find_member(id)
        .await?
        .filter(TeamMember::is_active)
        .ok_or_else(not_found)?;
    if !member.email().eq_ignore_ascii_case(&claims.email) {
        warn!(
            team_member_id = %id,
            account_id = %claims.sub,
            "link refused: email does not match team member"
        );
        return Err(ApiError::forbidden(
            "You can only link to the team member with your email",
        ));
    }

    let member = written(state.team_members.link(id, claims.sub).await?)?;
    info!(team_member_id = %id, account_id = %claims.sub, "account linked to team member");
    Ok(Json(member))
}

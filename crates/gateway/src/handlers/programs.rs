//! Training program handlers

use super::require_user;
use crate::extract::{AppJson, AuthUser};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use fitcore_common::{
    db::models::{TrainingProgram, UserRole},
    errors::{AppError, Result},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignProgramRequest {
    pub member_id: Uuid,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct ProgramResponse {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

impl From<TrainingProgram> for ProgramResponse {
    fn from(p: TrainingProgram) -> Self {
        Self {
            id: p.id,
            trainer_id: p.trainer_id,
            title: p.title,
            description: p.description,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub program_id: Uuid,
    pub member_id: Uuid,
    pub note: Option<String>,
    pub assigned_at: String,
}

/// Create a training program (trainers and admins)
pub async fn create_program(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<CreateProgramRequest>,
) -> Result<(StatusCode, Json<ProgramResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let user = require_user(&state, auth.user_id).await?;
    if !user.can_manage_programs() {
        return Err(AppError::Forbidden {
            message: "Creating programs requires the trainer role".to_string(),
        });
    }

    let program = state
        .repo()
        .create_program(user.id, request.title, request.description)
        .await?;

    tracing::info!(program_id = %program.id, trainer_id = %user.id, "Program created");

    Ok((StatusCode::CREATED, Json(program.into())))
}

/// List programs: trainers see programs they authored, members see
/// programs assigned to them
pub async fn list_programs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ProgramResponse>>> {
    let user = require_user(&state, auth.user_id).await?;
    let repo = state.repo();

    let programs = match user.user_role() {
        UserRole::Trainer | UserRole::Admin => repo.list_programs_by_trainer(user.id).await?,
        UserRole::Member => repo
            .list_programs_assigned_to(user.id)
            .await?
            .into_iter()
            .filter_map(|(_, program)| program)
            .collect(),
    };

    Ok(Json(programs.into_iter().map(Into::into).collect()))
}

/// Assign a program to a member (trainers and admins)
pub async fn assign_program(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(program_id): Path<Uuid>,
    AppJson(request): AppJson<AssignProgramRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>)> {
    let user = require_user(&state, auth.user_id).await?;
    if !user.can_manage_programs() {
        return Err(AppError::Forbidden {
            message: "Assigning programs requires the trainer role".to_string(),
        });
    }

    let repo = state.repo();

    let program = repo
        .find_program(program_id)
        .await?
        .ok_or_else(|| AppError::ProgramNotFound {
            id: program_id.to_string(),
        })?;

    // Trainers may only assign their own programs; admins may assign any
    if program.trainer_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden {
            message: "Only the authoring trainer can assign this program".to_string(),
        });
    }

    let member = repo
        .find_user_by_id(request.member_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound {
            id: request.member_id.to_string(),
        })?;

    let assignment = repo
        .assign_program(program.id, member.id, user.id, request.note)
        .await?;

    tracing::info!(
        program_id = %program.id,
        member_id = %member.id,
        assigned_by = %user.id,
        "Program assigned"
    );

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse {
            id: assignment.id,
            program_id: assignment.program_id,
            member_id: assignment.member_id,
            note: assignment.note,
            assigned_at: assignment.assigned_at.to_rfc3339(),
        }),
    ))
}

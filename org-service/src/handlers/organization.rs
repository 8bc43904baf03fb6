use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        organization::{
            CreateOrganizationRequest, CreatedOrganizationResponse, InviteRequest,
            OrganizationResponse, UpdateOrganizationRequest,
        },
        MessageResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Create an organization
#[utoipa::path(
    post,
    path = "/organization",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = CreatedOrganizationResponse),
        (status = 400, description = "Validation error or repeated member e-mail", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = state.org_service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedOrganizationResponse { organization_id }),
    ))
}

/// Fetch one organization
#[utoipa::path(
    get,
    path = "/organization/{organization_id}",
    params(("organization_id" = String, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization", body = OrganizationResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let org = state.org_service.get(&organization_id).await?;
    Ok(Json(org.into()))
}

/// List all organizations
#[utoipa::path(
    get,
    path = "/organization",
    responses(
        (status = 200, description = "Organizations", body = [OrganizationResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let orgs = state.org_service.list().await?;
    Ok(Json(orgs.into_iter().map(Into::into).collect()))
}

/// Update name and/or description
#[utoipa::path(
    put,
    path = "/organization/{organization_id}",
    params(("organization_id" = String, Path, description = "Organization ID")),
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Updated organization", body = OrganizationResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn update_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let org = state.org_service.update(&organization_id, req).await?;
    Ok(Json(org.into()))
}

/// Delete an organization
#[utoipa::path(
    delete,
    path = "/organization/{organization_id}",
    params(("organization_id" = String, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.org_service.delete(&organization_id).await?;
    Ok(Json(MessageResponse::new("Organization deleted successfully")))
}

/// Invite an existing user into an organization
#[utoipa::path(
    post,
    path = "/organization/{organization_id}/invite",
    params(("organization_id" = String, Path, description = "Organization ID")),
    request_body = InviteRequest,
    responses(
        (status = 200, description = "User invited", body = MessageResponse),
        (status = 400, description = "Already a member, unknown user or invalid body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Organizations",
    security(("bearer_auth" = []))
)]
pub async fn invite_user(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .org_service
        .invite(&organization_id, &req.user_email)
        .await?;
    Ok(Json(MessageResponse::new("User invited successfully")))
}

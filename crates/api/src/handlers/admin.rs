//! Handlers for the `/admin` resource (user provisioning).
//!
//! All handlers require the `ADMIN` role via [`RequireAdmin`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use docket_core::roles::Role;
use docket_db::models::user::UserResponse;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::auth::{create_account, validation_error};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// POST /api/v1/admin/users
///
/// Create a user with an explicit role. This is how admins are provisioned.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate().map_err(validation_error)?;

    let user =
        create_account(&state, input.username, input.email, &input.password, input.role).await?;

    tracing::info!(admin_id = admin.user_id, user_id = user.id, "User provisioned by admin");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

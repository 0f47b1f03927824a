//! Authentication routes.

use axum::{
    Json, Router,
    extract::State,
    routing::post,
};
use serde::Deserialize;

use crate::error::Result;
use crate::handlers::auth::{AuthSession, Login, Logout, RefreshToken, RegisterTenant};
use crate::middleware::CurrentUser;
use crate::pipeline::{RequestContext, dispatch_command};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Create the auth routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    business_name: String,
    contact_email: String,
    #[serde(default = "default_timezone")]
    timezone: String,
    owner_email: String,
    password: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let request = RegisterTenant {
        business_name: body.business_name,
        contact_email: body.contact_email,
        timezone: body.timezone,
        owner_email: body.owner_email,
        password: body.password,
    };

    let session = dispatch_command(&state, &RequestContext::anonymous(), request).await?;
    Ok(Json(ApiResponse::success(session)))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let request = Login {
        email: body.email,
        password: body.password,
    };

    let session = dispatch_command(&state, &RequestContext::anonymous(), request).await?;
    Ok(Json(ApiResponse::success(session)))
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<ApiResponse<AuthSession>>> {
    let request = RefreshToken {
        refresh_token: body.refresh_token,
    };

    let session = dispatch_command(&state, &RequestContext::anonymous(), request).await?;
    Ok(Json(ApiResponse::success(session)))
}

async fn logout(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<ApiResponse<()>>> {
    dispatch_command(&state, &ctx, Logout {}).await?;
    Ok(Json(ApiResponse::success_with_message((), "Logged out")))
}

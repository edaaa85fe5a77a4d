//! Usage report endpoints.

use actix_web::{HttpResponse, web};
use dolle_core::domain::{CounterKey, Scope};

use crate::middleware::error::AppResult;
use crate::replies::usage_reply;
use crate::state::AppState;

/// GET /api/usage/users/{user_id}
pub async fn user_usage(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    report(&state, Scope::User, path.into_inner()).await
}

/// GET /api/usage/servers/{server_id}
pub async fn server_usage(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    report(&state, Scope::Server, path.into_inner()).await
}

async fn report(state: &AppState, scope: Scope, id: String) -> AppResult<HttpResponse> {
    let key = CounterKey::new(scope, id);
    let summary = state.reporter.report(&key).await?;
    Ok(HttpResponse::Ok().json(usage_reply(scope, &key.id, summary)))
}

//! Generation command endpoint.

use actix_web::{HttpResponse, web};
use dolle_core::services::GenerationRequest;
use dolle_shared::dto::GenerateCommand;

use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::replies::generate_reply;
use crate::state::AppState;

/// Run a generation command.
///
/// POST /api/commands/generate
///
/// Denials and provider failures are ordinary replies; only store failures
/// and empty prompts end with an error status.
pub async fn generate(
    state: web::Data<AppState>,
    request_id: RequestId,
    body: web::Json<GenerateCommand>,
) -> AppResult<HttpResponse> {
    let command = body.into_inner();
    tracing::debug!(
        request_id = %request_id.as_str(),
        user_id = %command.user_id,
        server_id = %command.server_id,
        "Generation command received"
    );
    if command.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".to_string()));
    }

    let request = GenerationRequest {
        user_id: command.user_id,
        user_name: command.user_name,
        server_id: command.server_id,
        server_name: command.server_name,
        channel_name: command.channel_name,
        prompt: command.prompt,
    };

    let outcome = state.generation.generate(&request).await?;
    Ok(HttpResponse::Ok().json(generate_reply(outcome)))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use dolle_core::domain::QuotaPolicy;
    use dolle_shared::dto::{GenerateReply, GenerateStatus};
    use serde_json::json;

    use crate::handlers::{configure_routes, testing};

    fn command(user: &str, server: &str, prompt: &str) -> serde_json::Value {
        json!({
            "user_id": user,
            "user_name": "tester",
            "server_id": server,
            "server_name": "Alpha",
            "channel_name": "general",
            "prompt": prompt,
        })
    }

    #[actix_web::test]
    async fn test_generate_then_deny() {
        let state = testing::state(QuotaPolicy::new(1, 20), true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/commands/generate")
            .set_json(command("u1", "s1", "a red fox"))
            .to_request();
        let reply: GenerateReply = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reply.status, GenerateStatus::Completed);
        assert!(reply.artifact_url.is_some());

        let req = test::TestRequest::post()
            .uri("/api/commands/generate")
            .set_json(command("u1", "s1", "a blue fox"))
            .to_request();
        let reply: GenerateReply = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reply.status, GenerateStatus::Denied);
        assert_eq!(reply.message, "User rate limit exceeded.");
    }

    #[actix_web::test]
    async fn test_provider_failure_is_a_reply() {
        let state = testing::state(QuotaPolicy::default(), false);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/commands/generate")
            .set_json(command("u1", "s1", "a red fox"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let reply: GenerateReply = test::read_body_json(resp).await;
        assert_eq!(reply.status, GenerateStatus::Failed);
        assert!(reply.message.starts_with("Error generating image: "));
    }

    #[actix_web::test]
    async fn test_empty_prompt_is_rejected() {
        let state = testing::state(QuotaPolicy::default(), true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/commands/generate")
            .set_json(command("u1", "s1", "   "))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

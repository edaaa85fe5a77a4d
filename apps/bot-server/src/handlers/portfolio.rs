//! Portfolio endpoint.

use actix_web::{HttpResponse, web};
use dolle_shared::dto::PortfolioCommand;
use futures::{StreamExt, TryStreamExt, stream};

use crate::middleware::error::{AppError, AppResult};
use crate::replies::portfolio_item;
use crate::state::AppState;

/// Stream the caller's images as NDJSON, one [`PortfolioItem`] per line.
///
/// POST /api/portfolio
///
/// Modifiers are validated and the first entry is read before the response
/// starts, so an unreachable ledger is a 503. A store failure after that
/// point ends the stream early.
///
/// [`PortfolioItem`]: dolle_shared::dto::PortfolioItem
pub async fn portfolio(
    state: web::Data<AppState>,
    body: web::Json<PortfolioCommand>,
) -> AppResult<HttpResponse> {
    let command = body.into_inner();
    let entries = state.portfolio.lookup(
        &command.user_id,
        &command.server_name,
        &command.channel_name,
        command.args.as_slice(),
    )?;

    let (first, rest) = entries.into_future().await;
    let first = first.transpose()?;

    let lines = stream::iter(first.map(Ok))
        .chain(rest)
        .map_err(AppError::from)
        .and_then(|entry| async move {
            let mut line = serde_json::to_vec(&portfolio_item(entry))
                .map_err(|e| AppError::Internal(e.to_string()))?;
            line.push(b'\n');
            Ok(web::Bytes::from(line))
        });

    Ok(HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(lines))
}

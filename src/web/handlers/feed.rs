//! Public feed endpoint.

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::feed::{FeedFormat, FeedScope};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /feed/:id - RSS or JSON Feed for one channel, or `all`.
///
/// `:id` is `{public_id}.xml`, `{public_id}.json`, or the bare identifier.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (public_id, format) = FeedFormat::split_path(&path);
    if public_id.is_empty() {
        return Err(ApiError::not_found("feed not found"));
    }

    let scope = FeedScope::from_public_id(public_id);
    let rendered = state.synthesizer.render(&scope, format).await?;
    Ok(([(CONTENT_TYPE, rendered.content_type)], rendered.body))
}

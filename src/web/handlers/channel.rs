//! Channel management handlers.

use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::feed::FeedFormat;
use crate::store::ChannelRepository;
use crate::web::dto::{
    AddUrlQuery, ApiResponse, ChannelResponse, FetchQuery, ListChannelsQuery, PaginatedResponse,
    PauseQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/add/:id - Subscribe by real identifier.
pub async fn add_channel(
    State(state): State<Arc<AppState>>,
    Path(real_id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let link = state.pipeline.add_channel(&real_id).await?;
    Ok(Json(ApiResponse::new(link)))
}

/// GET /api/addurl?url= - Subscribe by one of the channel's article URLs.
pub async fn add_channel_by_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AddUrlQuery>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing url parameter"))?;
    let link = state.pipeline.add_channel_by_url(url.trim()).await?;
    Ok(Json(ApiResponse::new(link)))
}

/// DELETE /api/del/:id - Unsubscribe and drop the channel's articles.
pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let real_id = state.resolve(&public_id).await?;
    state.pipeline.delete_channel(&real_id).await?;
    Ok(Json(ApiResponse::new(true)))
}

/// GET /api/pause/:id?status=true|false - Pause or resume scheduled syncs.
pub async fn pause_channel(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
    Query(query): Query<PauseQuery>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let real_id = state.resolve(&public_id).await?;
    let paused = query.paused();
    state.pipeline.set_paused(&real_id, paused).await?;
    Ok(Json(ApiResponse::new(paused)))
}

/// GET /api/list - List subscribed channels.
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListChannelsQuery>,
) -> Result<Json<PaginatedResponse<ChannelResponse>>, ApiError> {
    let (page, size) = query.pagination().normalized();
    let (channels, total) = ChannelRepository::new(state.db.pool())
        .list(page, size, query.name.as_deref())
        .await?;

    let responses = channels
        .into_iter()
        .map(|channel| {
            let public_id = state.public_id(&channel.real_id);
            let feed = state.pipeline.feed_link(&channel.real_id);
            ChannelResponse::new(channel, public_id, feed)
        })
        .collect();

    Ok(Json(PaginatedResponse::new(responses, page, size, total)))
}

/// GET /api/fetch?bid= - Launch a sync now.
pub async fn trigger_fetch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    match query.bid.as_deref().filter(|b| !b.is_empty()) {
        Some(public_id) => {
            let real_id = state.resolve(public_id).await?;
            if ChannelRepository::new(state.db.pool())
                .get_by_real_id(&real_id)
                .await?
                .is_none()
            {
                return Err(ApiError::not_found(format!("channel {public_id} not found")));
            }
            state.scheduler.trigger_manual(Some(&real_id));
        }
        None => state.scheduler.trigger_manual(None),
    }
    Ok(Json(ApiResponse::new(true)))
}

/// GET /api/opml - OPML export of all subscriptions.
pub async fn export_opml(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.synthesizer.render_opml().await?;
    Ok(([(CONTENT_TYPE, FeedFormat::Rss.content_type())], body))
}

//! Article query handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::store::ArticleRepository;
use crate::web::dto::{ApiResponse, ArticleResponse, ArticlesQuery, PaginatedResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::OarssError;

/// GET /api/query - Articles, newest first.
pub async fn query_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticlesQuery>,
) -> Result<Json<PaginatedResponse<ArticleResponse>>, ApiError> {
    let real_id = match query.bid.as_deref().filter(|b| !b.is_empty()) {
        Some(public_id) => Some(state.resolve(public_id).await?),
        None => None,
    };

    let store_query = query.to_store_query(real_id);
    let (articles, total) = ArticleRepository::new(state.db.pool())
        .query(&store_query)
        .await?;

    let responses = articles
        .into_iter()
        .map(|article| {
            let channel = state.public_id(&article.channel_id);
            ArticleResponse::new(article, channel)
        })
        .collect();

    Ok(Json(PaginatedResponse::new(
        responses,
        store_query.page,
        store_query.page_size,
        total,
    )))
}

/// GET /api/article/:id - One article with its body.
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ArticleResponse>>, ApiError> {
    let article = ArticleRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or(OarssError::ArticleNotFound(id))?;

    let channel = state.public_id(&article.channel_id);
    Ok(Json(ApiResponse::new(ArticleResponse::new(article, channel))))
}

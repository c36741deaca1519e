//! Catalog inspection handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use cartwise_core::{find_matches, tokenize, CatalogStats, StorePrice, CONFIDENT_MATCH_THRESHOLD};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/catalog/stats - Entry, store and category counts
pub async fn catalog_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    Json(state.engine.catalog().stats())
}

/// Query parameters for catalog search
#[derive(Debug, Deserialize)]
pub struct CatalogSearchQuery {
    pub q: Option<String>,
    /// Minimum similarity (default 0.3)
    pub threshold: Option<f64>,
    /// Number of results (default 20, max 100)
    pub limit: Option<usize>,
}

/// A catalog entry scored against the search query
#[derive(Debug, Serialize)]
pub struct CatalogSearchHit {
    pub key: String,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub brand: Option<String>,
    pub similarity: f64,
    pub cheapest: Option<StorePrice>,
}

/// Catalog search response
#[derive(Debug, Serialize)]
pub struct CatalogSearchResponse {
    pub query: String,
    pub threshold: f64,
    pub results: Vec<CatalogSearchHit>,
}

/// GET /api/catalog/search?q=&threshold= - Token-similarity search over the catalog
pub async fn search_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogSearchQuery>,
) -> Result<Json<CatalogSearchResponse>, AppError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing q query parameter"))?;

    let threshold = params.threshold.unwrap_or(CONFIDENT_MATCH_THRESHOLD);
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(AppError::bad_request("threshold must be in (0, 1]"));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);

    let catalog = state.engine.catalog();
    let results = find_matches(&tokenize(&query), catalog, threshold)
        .into_iter()
        .take(limit)
        .map(|m| CatalogSearchHit {
            key: m.entry.key.clone(),
            name: m.entry.name.clone(),
            category: m.entry.category.clone(),
            unit: m.entry.unit.clone(),
            brand: m.entry.brand.clone(),
            similarity: m.similarity,
            cheapest: m.entry.cheapest().cloned(),
        })
        .collect();

    Ok(Json(CatalogSearchResponse {
        query,
        threshold,
        results,
    }))
}

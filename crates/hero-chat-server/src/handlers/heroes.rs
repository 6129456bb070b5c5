use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::HeroRecord;
use crate::services::HeroCatalog;
use crate::utils::error::ApiError;

pub async fn list_heroes(
    State(catalog): State<Arc<HeroCatalog>>,
) -> Result<Json<Vec<HeroRecord>>, ApiError> {
    let heroes = catalog.fetch_all().await?;
    Ok(Json(heroes.as_ref().clone()))
}

pub async fn get_hero(
    State(catalog): State<Arc<HeroCatalog>>,
    Path(id): Path<u32>,
) -> Result<Json<HeroRecord>, ApiError> {
    Ok(Json(catalog.fetch_by_id(id).await?))
}

pub async fn get_hero_by_name(
    State(catalog): State<Arc<HeroCatalog>>,
    Path(name): Path<String>,
) -> Result<Json<HeroRecord>, ApiError> {
    info!("Hero lookup by name: {}", name);
    Ok(Json(catalog.fetch_by_localized_name(&name).await?))
}

pub async fn get_heroes_by_role(
    State(catalog): State<Arc<HeroCatalog>>,
    Path(role): Path<String>,
) -> Result<Json<Vec<HeroRecord>>, ApiError> {
    info!("Hero lookup by role: {}", role);
    Ok(Json(catalog.fetch_by_role(&role).await?))
}

pub async fn get_hero_matches(
    State(catalog): State<Arc<HeroCatalog>>,
    Path(id): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(catalog.fetch_matches(id).await?))
}

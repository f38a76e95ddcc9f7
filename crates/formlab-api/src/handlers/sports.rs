//! Sport catalog.

use axum::extract::Path;
use axum::Json;

use formlab_core::{movements, Sport, SportInfo};

use crate::error::ApiError;

pub async fn list_sports() -> Json<Vec<SportInfo>> {
    Json(movements::catalog())
}

pub async fn get_sport(Path(sport_id): Path<String>) -> Result<Json<SportInfo>, ApiError> {
    sport_id
        .parse::<Sport>()
        .map(|sport| Json(sport.info()))
        .map_err(|_| ApiError::NotFound("Sport not found".to_string()))
}

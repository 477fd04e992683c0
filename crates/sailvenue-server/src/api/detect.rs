use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use sailvenue_core::GeoPoint;
use sailvenue_detect::{DetectError, DetectOptions, DetectionResult};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DetectQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub max_alternatives: Option<usize>,
    pub deadline_ms: Option<u64>,
}

pub(super) async fn detect_venue(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<DetectQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<DetectionResult>>, ApiError> {
    let Query(query) = query.map_err(|e| {
        ApiError::new(req_id.0.clone(), "validation_error", e.body_text())
    })?;

    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "lat and lng query parameters are required",
        ));
    };

    let options = DetectOptions {
        radius_km: query.radius_km,
        max_alternatives: query.max_alternatives,
        deadline_ms: query.deadline_ms,
    };

    let result = state
        .engine
        .detect(GeoPoint::new(lat, lng), &options)
        .await
        .map_err(|e| map_detect_error(req_id.0.clone(), &e))?;

    tracing::info!(
        request_id = %req_id.0,
        venue_id = result.venue_id.as_deref().unwrap_or("-"),
        source = %result.source,
        cached = result.cached,
        "venue detection served"
    );

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_detect_error(request_id: String, error: &DetectError) -> ApiError {
    match error {
        DetectError::Validation(reason) => ApiError::new(request_id, "validation_error", reason),
        other => {
            tracing::error!(error = %other, "venue detection failed");
            ApiError::new(request_id, "internal_error", "venue detection failed")
        }
    }
}

//! Thin HTTP shell over the engine. Handlers deserialize, call one engine
//! operation and map `EngineError` onto status codes; nothing else lives
//! here.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metering_client::domain::{CommodityValues, Reading};
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::engine::{Engine, EngineError};
use crate::store::ReadingStore;

pub fn router<S: ReadingStore + 'static>(engine: Arc<Engine<S>>) -> Router {
    Router::new()
        .route("/readings", post(ingest_reading))
        .route("/areas", get(list_areas))
        .route("/areas/:area", get(area_summary))
        .route("/dashboard", get(dashboard))
        .route("/forecast", get(forecast))
        .route("/export", get(export))
        .with_state(engine)
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn map_error(e: EngineError) -> ErrorResponse {
    let status = match &e {
        EngineError::InvalidArea(_) => StatusCode::BAD_REQUEST,
        EngineError::NoDataInRange { .. } => StatusCode::NOT_FOUND,
        EngineError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(json!({ "error": e.to_string() })))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Json<serde_json::Value>, ErrorResponse> {
    serde_json::to_value(value).map(Json).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

#[derive(Deserialize)]
struct IncomingReading {
    area: String,
    date: Date,
    commodity_readings: CommodityValues,
}

async fn ingest_reading<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
    Json(payload): Json<IncomingReading>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    metrics::counter!("http_ingest_requests_total").increment(1);

    let reading = Reading {
        area: payload.area,
        date: payload.date,
        commodity_readings: payload.commodity_readings,
    };

    let record = engine.ingest(reading).await.map_err(map_error)?;
    to_json(&record)
}

async fn list_areas<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
) -> Json<serde_json::Value> {
    Json(json!({ "areas": engine.catalog().areas() }))
}

async fn area_summary<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
    Path(area): Path<String>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let latest = engine.area_summary(&area).await.map_err(map_error)?;

    match latest {
        Some(record) => to_json(&record),
        None => Ok(Json(json!({ "area": area, "message": "no data for this area" }))),
    }
}

async fn dashboard<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let view = engine.dashboard().await.map_err(map_error)?;
    to_json(&view)
}

#[derive(Deserialize)]
struct ForecastQuery {
    /// Comma-separated area names; omitted means the whole catalog.
    areas: Option<String>,
    horizon: Option<usize>,
}

async fn forecast<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let areas: Vec<String> = query
        .areas
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let series = engine.forecast(&areas, query.horizon).await.map_err(map_error)?;
    to_json(&series)
}

#[derive(Deserialize)]
struct ExportQuery {
    start: Date,
    end: Date,
}

async fn export<S: ReadingStore>(
    State(engine): State<Arc<Engine<S>>>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
    let matrix = engine.export(query.start, query.end).await.map_err(map_error)?;
    to_json(&matrix)
}

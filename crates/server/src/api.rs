//! Route handlers.
//!
//! GET runs a detector in backend mode (the series comes from a registered
//! adapter named by the `backend` query parameter); POST runs the same
//! detector in inline mode (the series is the request body). Tunables
//! arrive as query parameters in both modes.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use vigil_backend::normalize;
use vigil_core::TimeSeries;
use vigil_detect::{
    Detect, FirstHourAverage, Grubbs, HistogramBins, LeastSquares, MeanSubtractionCumulation,
    MedianAbsoluteDeviation, StddevFromAverage, StddevFromMovingAverage, Tukey, Verdict,
};

use crate::error::ApiError;
use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Backends ──────────────────────────────────────────────────────

pub async fn list_backends(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.names())
}

// ── Parameter helpers ─────────────────────────────────────────────

fn parse_param<T: FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ApiError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_param(key, raw)),
    }
}

/// The eight skyline-family detectors, keyed by path segment.
#[derive(Debug, Clone, Copy)]
enum SkylineAlgo {
    MedianAbsoluteDeviation,
    Grubbs,
    FirstHourAverage,
    HistogramBins,
    LeastSquares,
    MeanSubtractionCumulation,
    StddevFromAverage,
    StddevFromMovingAverage,
}

impl SkylineAlgo {
    fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "medianabsolutedeviation" => Some(Self::MedianAbsoluteDeviation),
            "grubbs" => Some(Self::Grubbs),
            "firsthouraverage" => Some(Self::FirstHourAverage),
            "histogrambins" => Some(Self::HistogramBins),
            "leastsquares" => Some(Self::LeastSquares),
            "meansubtractioncumulation" => Some(Self::MeanSubtractionCumulation),
            "stddevfromaverage" => Some(Self::StddevFromAverage),
            "stddevfrommovingaverage" => Some(Self::StddevFromMovingAverage),
            _ => None,
        }
    }

    /// Build the detector with query-supplied overrides on top of the
    /// documented defaults.
    fn build(self, params: &HashMap<String, String>) -> Result<Box<dyn Detect>, ApiError> {
        Ok(match self {
            Self::MedianAbsoluteDeviation => {
                let mut detector = MedianAbsoluteDeviation::default();
                if let Some(threshold) = parse_param(params, "deviation_threshold")? {
                    detector.deviation_threshold = threshold;
                }
                Box::new(detector)
            }
            Self::Grubbs => Box::new(Grubbs),
            Self::FirstHourAverage => {
                let mut detector = FirstHourAverage::default();
                if let Some(duration) = parse_param(params, "full_duration")? {
                    detector.full_duration = duration;
                }
                Box::new(detector)
            }
            Self::HistogramBins => {
                let mut detector = HistogramBins::default();
                if let Some(bins) = parse_param::<usize>(params, "bins")? {
                    if bins == 0 {
                        return Err(ApiError::bad_param("bins", "0"));
                    }
                    detector.bins = bins;
                }
                Box::new(detector)
            }
            Self::LeastSquares => Box::new(LeastSquares),
            Self::MeanSubtractionCumulation => {
                let mut detector = MeanSubtractionCumulation::default();
                if let Some(com) = parse_param(params, "com")? {
                    detector.com = com;
                }
                Box::new(detector)
            }
            Self::StddevFromAverage => Box::new(StddevFromAverage),
            Self::StddevFromMovingAverage => {
                let mut detector = StddevFromMovingAverage::default();
                if let Some(com) = parse_param(params, "com")? {
                    detector.com = com;
                }
                Box::new(detector)
            }
        })
    }
}

fn build_tukey(params: &HashMap<String, String>) -> Result<Tukey, ApiError> {
    let mut tukey = Tukey::default();
    if let Some(threshold) = parse_param(params, "outlier_threshold")? {
        tukey.outlier_threshold = threshold;
    }
    Ok(tukey)
}

fn inline_series(
    params: &HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<TimeSeries, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let time_index = parse_param(params, "tidx")?;
    let value_index = parse_param(params, "vidx")?;
    Ok(normalize::from_inline(
        body,
        content_type,
        time_index,
        value_index,
    )?)
}

// ── Skyline detectors ─────────────────────────────────────────────

pub async fn skyline_get(
    State(state): State<Arc<AppState>>,
    Path(algo): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Verdict>, ApiError> {
    let algo = SkylineAlgo::from_path(&algo).ok_or_else(|| ApiError::NotFound(algo.clone()))?;
    let series = normalize::from_backend(&state.registry, &params).await?;
    let detector = algo.build(&params)?;
    let verdict = detector.detect(&series);
    debug!(?algo, anomalous = verdict.is_anomalous(), "backend-mode verdict");
    Ok(Json(verdict))
}

pub async fn skyline_post(
    Path(algo): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Verdict>, ApiError> {
    let algo = SkylineAlgo::from_path(&algo).ok_or_else(|| ApiError::NotFound(algo.clone()))?;
    let series = inline_series(&params, &headers, &body)?;
    let detector = algo.build(&params)?;
    Ok(Json(detector.detect(&series)))
}

// ── Tukey ─────────────────────────────────────────────────────────

pub async fn tukey_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Verdict>, ApiError> {
    let series = normalize::from_backend(&state.registry, &params).await?;
    let tukey = build_tukey(&params)?;
    Ok(Json(tukey.detect(&series)))
}

pub async fn tukey_post(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Verdict>, ApiError> {
    let series = inline_series(&params, &headers, &body)?;
    let tukey = build_tukey(&params)?;
    Ok(Json(tukey.detect(&series)))
}

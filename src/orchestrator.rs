use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::derive_context;
use crate::fallback::compose_fallback;
use crate::generate::{GenerateError, PoemGenerator, build_prompt};
use crate::geocode::LocationResolver;
use crate::poem_cache::{PoemCache, fingerprint};
use crate::rate_limit::RateLimiter;

/// Body of `POST /api/poem`. Coordinates are mandatory; time and date are
/// defaulted to server "now" when missing or malformed.
#[derive(Debug, Default, Deserialize)]
pub struct PoemRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub time: Option<String>,
    pub date: Option<String>,
}

/// Health report for `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub ollama: &'static str,
    pub model: String,
}

/// Errors that surface to the HTTP caller. Upstream generation and
/// geocoding failures never appear here; those degrade to the fallback
/// poem or the sentinel place inside the orchestrator.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Orchestrates a poem request: validate, resolve the place, consult the
/// cache, probe and call the generator, fall back when anything upstream
/// fails. Owns every piece of shared state.
pub struct PoemService {
    resolver: LocationResolver,
    generator: Arc<dyn PoemGenerator>,
    cache: PoemCache,
    limiter: RateLimiter,
    model: String,
}

impl PoemService {
    pub fn new(
        resolver: LocationResolver,
        generator: Arc<dyn PoemGenerator>,
        cache: PoemCache,
        limiter: RateLimiter,
        model: String,
    ) -> Self {
        Self {
            resolver,
            generator,
            cache,
            limiter,
            model,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Produces a poem for the request. Always returns a poem for valid
    /// coordinates; only input validation can fail here.
    pub async fn compose_poem(&self, req: PoemRequest) -> Result<String, ServeError> {
        let (lat, lon) = validate_coords(req.latitude, req.longitude)?;
        let now = Local::now();
        let time = normalize_time(req.time.as_deref(), &now);
        let date = normalize_date(req.date.as_deref(), &now);

        let place = self.resolver.resolve(lat, lon).await;
        let context = derive_context(&time, &date);
        let key = fingerprint(&place, &time, &date);
        let prompt = build_prompt(&place, &time, &date, context.as_ref());

        let generated = self
            .cache
            .get_or_generate(&key, || async {
                if !self.generator.probe().await {
                    return Err(GenerateError::Unreachable(
                        "availability probe failed".into(),
                    ));
                }
                self.generator.generate(&prompt).await
            })
            .await;

        match generated {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(error = %e, %place, "generation unavailable, serving fallback poem");
                Ok(compose_fallback(&time, &date, &place, context.as_ref()))
            }
        }
    }

    /// Resolves coordinates for `GET /api/location`.
    pub async fn resolve_location(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<String, ServeError> {
        let (lat, lon) = validate_coords(lat, lon)?;
        Ok(self.resolver.resolve(lat, lon).await)
    }

    /// Probes the generator and reports service health.
    pub async fn health(&self) -> HealthStatus {
        let available = self.generator.probe().await;
        HealthStatus {
            status: "ok",
            ollama: if available { "available" } else { "unavailable" },
            model: self.model.clone(),
        }
    }
}

fn validate_coords(lat: Option<f64>, lon: Option<f64>) -> Result<(f64, f64), ServeError> {
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Err(ServeError::InvalidInput(
            "latitude and longitude are required".into(),
        ));
    };
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ServeError::InvalidInput(format!(
            "latitude {lat} is out of range [-90, 90]"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(ServeError::InvalidInput(format!(
            "longitude {lon} is out of range [-180, 180]"
        )));
    }
    Ok((lat, lon))
}

fn normalize_time(time: Option<&str>, now: &DateTime<Local>) -> String {
    match time {
        Some(t) if NaiveTime::parse_from_str(t, "%H:%M").is_ok() => t.to_string(),
        _ => now.format("%H:%M").to_string(),
    }
}

fn normalize_date(date: Option<&str>, now: &DateTime<Local>) -> String {
    match date {
        Some(d) if NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok() => d.to_string(),
        _ => now.format("%Y-%m-%d").to_string(),
    }
}

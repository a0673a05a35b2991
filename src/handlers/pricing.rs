use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::PricingSettings;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/pricing-settings", get(show).put(upsert))
}

/// GET /api/pricing-settings - the single logical pricing row
async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::PricingSettings, Action::List)?;

    let settings = sqlx::query_as::<_, PricingSettings>(
        "SELECT * FROM pricing_settings ORDER BY updated_at DESC LIMIT 1",
    )
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Pricing settings are not configured"))?;

    Ok(Json(json!({ "success": true, "data": settings })))
}

#[derive(Debug, Deserialize)]
struct PricingPayload {
    labor_rate: BigDecimal,
    callout_fee: BigDecimal,
    parts_markup_pct: BigDecimal,
}

impl PricingPayload {
    fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("labor_rate", &self.labor_rate),
            ("callout_fee", &self.callout_fee),
            ("parts_markup_pct", &self.parts_markup_pct),
        ] {
            if *value < BigDecimal::from(0) {
                return Err(ApiError::invalid_field(field, "must not be negative"));
            }
        }
        Ok(())
    }
}

/// PUT /api/pricing-settings - update in place, creating the row on first
/// configuration.
async fn upsert(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PricingPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::PricingSettings, Action::Update)?;
    payload.validate()?;

    let updated = sqlx::query_as::<_, PricingSettings>(
        r#"
        UPDATE pricing_settings
        SET labor_rate = $1, callout_fee = $2, parts_markup_pct = $3, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(&payload.labor_rate)
    .bind(&payload.callout_fee)
    .bind(&payload.parts_markup_pct)
    .fetch_optional(&state.pool)
    .await?;

    let settings = match updated {
        Some(row) => row,
        None => {
            sqlx::query_as::<_, PricingSettings>(
                r#"
                INSERT INTO pricing_settings (id, labor_rate, callout_fee, parts_markup_pct, updated_at)
                VALUES ($1, $2, $3, $4, now())
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&payload.labor_rate)
            .bind(&payload.callout_fee)
            .bind(&payload.parts_markup_pct)
            .fetch_one(&state.pool)
            .await?
        }
    };

    Ok(Json(json!({ "success": true, "data": settings })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_rates_are_rejected() {
        let payload = PricingPayload {
            labor_rate: BigDecimal::from(-1),
            callout_fee: BigDecimal::from(0),
            parts_markup_pct: BigDecimal::from(10),
        };
        assert!(payload.validate().is_err());
    }
}

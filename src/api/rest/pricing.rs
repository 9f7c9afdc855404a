use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::auth::Caller;
use crate::engine::{pricing, surge};
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::job::{JobItem, PriceBreakdown};
use crate::models::pricing::PricingRule;
use crate::models::surge::{SurgeZone, TimeWindow};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", post(create_quote))
        .route("/pricing/rules", post(create_rule).get(list_rules))
        .route("/pricing/rules/:id", patch(update_rule))
        .route("/pricing/surge-zones", post(create_zone).get(list_zones))
        .route("/pricing/surge-zones/:id", patch(update_zone))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<JobItem>,
    pub location: GeoPoint,
    pub volume_adjustment: Option<Decimal>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    pub price: PriceBreakdown,
    pub surge_multiplier: Decimal,
    pub currency: &'static str,
}

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub item_type: String,
    pub base_price: Decimal,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub base_price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateZoneRequest {
    pub name: String,
    pub boundary: Vec<GeoPoint>,
    pub multiplier: Decimal,
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub days_of_week: Vec<u32>,
}

#[derive(Deserialize)]
pub struct UpdateZoneRequest {
    pub multiplier: Option<Decimal>,
    pub is_active: Option<bool>,
    pub window: Option<TimeWindow>,
    pub days_of_week: Option<Vec<u32>>,
}

/// Pure estimate; prices the basket exactly like a booking would without
/// creating a job.
async fn create_quote(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    caller.require_role(&[Role::Customer, Role::Dispatcher, Role::Admin])?;

    let priced_at = payload.scheduled_at.unwrap_or_else(Utc::now);
    let zones = state.store.surge_zones(caller.tenant_id);
    let surge_multiplier = surge::resolve(&zones, &payload.location, priced_at);

    let rules = state.store.active_rule_snapshot(caller.tenant_id);
    let price = pricing::quote(
        &rules,
        &payload.items,
        payload.volume_adjustment,
        surge_multiplier,
        state.config.service_fee_rate,
    )?;

    Ok(Json(QuoteResponse {
        price,
        surge_multiplier,
        currency: "USD",
    }))
}

async fn create_rule(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<Json<PricingRule>, AppError> {
    caller.require_role(&[Role::Admin])?;

    let item_type = payload.item_type.trim().to_string();
    if item_type.is_empty() {
        return Err(AppError::validation("item_type", "item type cannot be empty"));
    }
    if payload.base_price < Decimal::ZERO {
        return Err(AppError::validation(
            "base_price",
            "base price cannot be negative",
        ));
    }

    if state
        .store
        .pricing_rule_by_item_type(caller.tenant_id, &item_type)
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "pricing rule for {item_type} already exists"
        )));
    }

    let now = Utc::now();
    let rule = PricingRule {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        item_type,
        base_price: pricing::round_money(payload.base_price),
        description: payload.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_pricing_rule(rule.clone());
    Ok(Json(rule))
}

async fn list_rules(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<PricingRule>>, AppError> {
    caller.require_role(&[Role::Customer, Role::Dispatcher, Role::Admin])?;

    let mut rules = state.store.pricing_rules(caller.tenant_id);
    rules.sort_by(|a, b| a.item_type.cmp(&b.item_type));
    Ok(Json(rules))
}

async fn update_rule(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRuleRequest>,
) -> Result<Json<PricingRule>, AppError> {
    caller.require_role(&[Role::Admin])?;

    if let Some(base_price) = payload.base_price {
        if base_price < Decimal::ZERO {
            return Err(AppError::validation(
                "base_price",
                "base price cannot be negative",
            ));
        }
    }

    let updated = state
        .store
        .with_pricing_rule_mut(caller.tenant_id, id, |rule| {
            if let Some(base_price) = payload.base_price {
                rule.base_price = pricing::round_money(base_price);
            }
            if let Some(description) = payload.description.clone() {
                rule.description = Some(description);
            }
            if let Some(is_active) = payload.is_active {
                rule.is_active = is_active;
            }
            rule.updated_at = Utc::now();
            Ok(rule.clone())
        })?;

    Ok(Json(updated))
}

async fn create_zone(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<CreateZoneRequest>,
) -> Result<Json<SurgeZone>, AppError> {
    caller.require_role(&[Role::Admin])?;

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name", "name cannot be empty"));
    }
    if payload.boundary.len() < 3 {
        return Err(AppError::validation(
            "boundary",
            "a zone needs at least three vertices",
        ));
    }
    if payload.multiplier < Decimal::ONE {
        return Err(AppError::validation(
            "multiplier",
            "surge multiplier must be at least 1.00",
        ));
    }
    if payload.days_of_week.iter().any(|day| *day > 6) {
        return Err(AppError::validation(
            "days_of_week",
            "days are counted 0-6 from Monday",
        ));
    }

    let now = Utc::now();
    let zone = SurgeZone {
        id: Uuid::new_v4(),
        tenant_id: caller.tenant_id,
        name: payload.name.trim().to_string(),
        boundary: payload.boundary,
        multiplier: payload.multiplier,
        is_active: true,
        window: payload.window,
        days_of_week: payload.days_of_week,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_surge_zone(zone.clone());
    Ok(Json(zone))
}

async fn list_zones(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<SurgeZone>>, AppError> {
    caller.require_role(&[Role::Dispatcher, Role::Admin])?;
    Ok(Json(state.store.surge_zones(caller.tenant_id)))
}

async fn update_zone(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateZoneRequest>,
) -> Result<Json<SurgeZone>, AppError> {
    caller.require_role(&[Role::Admin])?;

    if let Some(multiplier) = payload.multiplier {
        if multiplier < Decimal::ONE {
            return Err(AppError::validation(
                "multiplier",
                "surge multiplier must be at least 1.00",
            ));
        }
    }
    if let Some(days) = &payload.days_of_week {
        if days.iter().any(|day| *day > 6) {
            return Err(AppError::validation(
                "days_of_week",
                "days are counted 0-6 from Monday",
            ));
        }
    }

    let updated = state
        .store
        .with_surge_zone_mut(caller.tenant_id, id, |zone| {
            if let Some(multiplier) = payload.multiplier {
                zone.multiplier = multiplier;
            }
            if let Some(is_active) = payload.is_active {
                zone.is_active = is_active;
            }
            if let Some(window) = payload.window {
                zone.window = Some(window);
            }
            if let Some(days) = payload.days_of_week.clone() {
                zone.days_of_week = days;
            }
            zone.updated_at = Utc::now();
            Ok(zone.clone())
        })?;

    Ok(Json(updated))
}

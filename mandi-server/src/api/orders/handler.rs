//! Order API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use shared::ApiResponse;
use shared::models::{Order, Payment, Shipment, ShipmentStatus};
use shared::types::{Party, UserRole};

use crate::api::{AppError, AppResult, CommandQuery, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::{
    CancelOrderAction, ConfirmDeliveryAction, ProcessPaymentAction, TrackingEventInput,
    UpdateShipmentAction,
};

/// Load an order and reject callers who are neither a party nor admin.
fn load_order_for_participant(
    state: &AppState,
    user: &CurrentUser,
    order_id: &str,
) -> Result<Order, AppError> {
    let order = state
        .storage
        .get_order(order_id)?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    if order.party_of(&user.id).is_none() && user.role != UserRole::Admin {
        return Err(AppError::forbidden("Not authorized"));
    }
    Ok(order)
}

/// Role filter for the order list
#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    pub role: Option<Party>,
}

/// List the caller's orders, newest first. `?role=buyer|seller` narrows
/// to one side of the trade.
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<MyOrdersQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let mut orders = state.storage.list_orders_for_user(&user.id)?;
    if let Some(role) = query.role {
        orders.retain(|order| match role {
            Party::Buyer => order.buyer_id == user.id,
            Party::Seller => order.seller_id == user.id,
        });
    }
    Ok(ok(orders))
}

/// Get an order by id (participants or admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = load_order_for_participant(&state, &user, &id)?;
    Ok(ok(order))
}

/// Payment request
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub command_id: Option<String>,
    pub payment_method: String,
    pub payment_data: Option<serde_json::Value>,
}

/// Pay for a pending order (buyer only).
///
/// The provider is simulated: the failure dice roll happens here so the
/// command itself stays deterministic and replays to the same outcome.
/// A declined capture persists the failed payment, leaves the order
/// pending, and comes back as a non-success envelope carrying the
/// payment record.
pub async fn pay(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PayRequest>,
) -> AppResult<Response> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let simulate_failure = rand::random::<f64>() < state.config.payment_failure_rate;
    let action = ProcessPaymentAction {
        order_id: id,
        payment_method: payload.payment_method,
        provider_data: payload.payment_data,
        simulate_failure,
    };
    let outcome = state.manager.execute(&action, &metadata)?;
    if outcome.captured {
        return Ok(ok(outcome).into_response());
    }
    let body = Json(ApiResponse::error_with_data(
        "E1401",
        "Payment processing failed",
        outcome.payment,
    ));
    Ok((StatusCode::BAD_REQUEST, body).into_response())
}

/// Cancel request
#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub command_id: Option<String>,
    pub reason: String,
}

/// Cancel an order (buyer or seller, while still cancellable)
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = CancelOrderAction {
        order_id: id,
        reason: payload.reason,
    };
    state.manager.execute(&action, &metadata)?;
    Ok(ok(()))
}

/// Confirm delivery of a shipped order (buyer only). Completes the
/// order, releases escrow and creates the seller payout.
pub async fn confirm_delivery(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<ApiResponse<()>>> {
    let metadata = CommandMetadata::for_user(query.command_id, &user);
    let action = ConfirmDeliveryAction { order_id: id };
    state.manager.execute(&action, &metadata)?;
    Ok(ok(()))
}

/// Get the shipment for an order (participants or admin)
pub async fn get_shipment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    load_order_for_participant(&state, &user, &id)?;
    let shipment = state
        .storage
        .get_shipment(&id)?
        .ok_or_else(|| AppError::not_found("Shipment not found"))?;
    Ok(ok(shipment))
}

/// Shipment update request
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    pub command_id: Option<String>,
    pub tracking_id: Option<String>,
    pub carrier_name: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub tracking_event: Option<TrackingEventInput>,
}

/// Update shipment details or append a tracking event (seller only)
pub async fn update_shipment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateShipmentRequest>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = UpdateShipmentAction {
        order_id: id,
        tracking_id: payload.tracking_id,
        carrier_name: payload.carrier_name,
        status: payload.status,
        tracking_event: payload.tracking_event,
    };
    let shipment = state.manager.execute(&action, &metadata)?;
    Ok(ok(shipment))
}

/// List payment attempts for an order (participants or admin)
pub async fn list_payments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Payment>>>> {
    load_order_for_participant(&state, &user, &id)?;
    let payments = state.storage.list_payments_for_order(&id)?;
    Ok(ok(payments))
}

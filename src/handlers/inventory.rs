use crate::auth::SessionIdentity;
use crate::dto::inventory::{
    parse_bulk_payload, CreatedCount, DeleteConfirmation, DeleteInventoryQuery, InventoryLineRequest,
    InventoryRow, UpdateInventoryRequest, ITEMS_REQUIRED, ITEM_DELETED,
};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response, JsonBody};
use crate::presentation::InventoryTable;
use crate::services::inventory::InventoryService;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use tracing::debug;

pub const CREATE_FAILED: &str = "Unable to add inventory items.";
pub const LIST_FAILED: &str = "Unable to retrieve inventory items.";
pub const UPDATE_FAILED: &str = "Unable to update inventory item.";
pub const DELETE_FAILED: &str = "Unable to delete inventory item.";

// Trait for inventory handler state that provides access to inventory service
pub trait InventoryHandlerState: Clone + Send + Sync + 'static {
    fn inventory_service(&self) -> &InventoryService;
}

/// Routes mounted under `/api/v1/hospital/inventory`. Callers must layer a
/// session validator on top.
pub fn inventory_routes<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new()
        .route(
            "/",
            get(list_inventory::<S>)
                .post(create_inventory::<S>)
                .put(update_inventory::<S>)
                .delete(delete_inventory::<S>),
        )
        .route("/table", get(inventory_table::<S>))
}

/// Record a batch of stock lines for the caller's hospital
#[utoipa::path(
    post,
    path = "/api/v1/hospital/inventory",
    request_body = Vec<InventoryLineRequest>,
    responses(
        (status = 201, description = "Inventory records created", body = CreatedCount,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing fields or unknown department", body = crate::errors::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
        (status = 404, description = "Hospital not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory<S>(
    State(state): State<S>,
    Extension(identity): Extension<SessionIdentity>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let Json(payload) = payload.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Bulk create body rejected");
        ServiceError::BadRequest(ITEMS_REQUIRED.to_string())
    })?;
    let lines = parse_bulk_payload(payload)?;

    let count = state
        .inventory_service()
        .create_bulk(&identity, lines)
        .await
        .map_err(|e| e.mask(CREATE_FAILED))?;

    Ok(created_response(CreatedCount { count }))
}

/// List the caller's inventory with department and catalog details
#[utoipa::path(
    get,
    path = "/api/v1/hospital/inventory",
    responses(
        (status = 200, description = "Inventory list returned", body = Vec<InventoryRow>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory<S>(
    State(state): State<S>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let rows = state
        .inventory_service()
        .list(&identity)
        .await
        .map_err(|e| e.mask(LIST_FAILED))?;

    Ok(success_response(rows))
}

/// Change the quantity and/or expiry date of one record
#[utoipa::path(
    put,
    path = "/api/v1/hospital/inventory",
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Record updated", body = crate::entities::medical_inventory::Model),
        (status = 400, description = "Missing id or nothing to update", body = crate::errors::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found or access denied", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_inventory<S>(
    State(state): State<S>,
    Extension(identity): Extension<SessionIdentity>,
    JsonBody(payload): JsonBody<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let update = payload.into_update()?;

    let record = state
        .inventory_service()
        .update(&identity, update)
        .await
        .map_err(|e| e.mask(UPDATE_FAILED))?;

    Ok(success_response(record))
}

/// Delete one record
#[utoipa::path(
    delete,
    path = "/api/v1/hospital/inventory",
    params(DeleteInventoryQuery),
    responses(
        (status = 200, description = "Record deleted", body = DeleteConfirmation),
        (status = 400, description = "Missing or malformed id", body = crate::errors::ErrorResponse),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found or access denied", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory<S>(
    State(state): State<S>,
    Extension(identity): Extension<SessionIdentity>,
    query: Result<Query<DeleteInventoryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let Query(query) = query?;
    let id = query.record_id()?;

    state
        .inventory_service()
        .delete(&identity, id)
        .await
        .map_err(|e| e.mask(DELETE_FAILED))?;

    Ok(success_response(DeleteConfirmation {
        message: ITEM_DELETED.to_string(),
    }))
}

/// The caller's inventory rendered as table rows
#[utoipa::path(
    get,
    path = "/api/v1/hospital/inventory/table",
    responses(
        (status = 200, description = "Rendered table", body = InventoryTable),
        (status = 401, description = "No valid session", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn inventory_table<S>(
    State(state): State<S>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: InventoryHandlerState,
{
    let rows = state
        .inventory_service()
        .list(&identity)
        .await
        .map_err(|e| e.mask(LIST_FAILED))?;

    Ok(success_response(InventoryTable::render(&rows, chrono::Utc::now())))
}

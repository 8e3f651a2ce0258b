use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    Extension,
};
use garde::Validate;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::decode_request;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::state::AppState;
use crate::types::{ItemId, Role};

/// Roles allowed to remove items from the shop
const SHOP_EDIT_ROLES: [Role; 2] = [Role::ShopEditor, Role::SuperAdmin];

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteItemRequest {
    #[serde(default)]
    #[garde(range(min = 1))]
    pub item_id: ItemId,
}

/// DELETE /shop/item - remove an item from the shop
///
/// The role check runs before the body is read, so callers without a shop editing role
/// always get 403, whatever the body holds or however large it is.
#[tracing::instrument(name = "handlers.delete_item", skip_all)]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    request: Request,
) -> ApiResult<()> {
    if !principal.has_any_role(&SHOP_EDIT_ROLES) {
        tracing::error!(user_id = principal.user_id, role = %principal.role, "access was denied");
        return Err(ApiError::forbidden("access was denied"));
    }

    let body = Bytes::from_request(request, &state).await.map_err(|e| {
        tracing::error!("failed to read request body: {}", e);
        ApiError::InvalidJson
    })?;

    let req: DeleteItemRequest = decode_request(&body)?;
    tracing::info!(item_id = req.item_id, "request body decoded");

    state.store.delete_item(req.item_id).await.map_err(|e| {
        tracing::error!("failed to delete item from shop: {}", e);
        ApiError::unprocessable_entity("failed to delete item from shop")
    })?;

    tracing::info!(item_id = req.item_id, "item successfully deleted from shop");

    Ok(ApiResponse::ok())
}

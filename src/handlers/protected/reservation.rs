use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension,
};
use chrono::NaiveDateTime;
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::database::models::{ActualPlace, NewReservation, Place, Reservation};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::middleware::{ApiResponse, ApiResult, Principal};
use crate::period::Period;
use crate::state::AppState;
use crate::store::StoreError;
use crate::types::{PlaceId, ReservationId};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub places: Vec<ActualPlace>,
}

#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub place: Place,
}

#[derive(Debug, Serialize)]
pub struct ReservationsResponse {
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddReservationRequest {
    #[serde(default)]
    #[garde(range(min = 1))]
    pub place_id: PlaceId,
    #[serde(default)]
    #[garde(required)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    #[garde(required)]
    pub finish: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservationRequest {
    #[serde(default)]
    #[garde(range(min = 1))]
    pub reservation_id: ReservationId,
    #[serde(default)]
    #[garde(range(min = 1))]
    pub place_id: PlaceId,
    #[serde(default)]
    #[garde(required)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    #[garde(required)]
    pub finish: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteReservationRequest {
    #[serde(default)]
    #[garde(range(min = 1))]
    pub reservation_id: ReservationId,
}

/// A booking period must be non-empty: `start < finish`
fn booking_period(
    start: Option<NaiveDateTime>,
    finish: Option<NaiveDateTime>,
) -> Result<Period, ApiError> {
    let mut field_errors = BTreeMap::new();
    match (start, finish) {
        (Some(start), Some(finish)) if start < finish => return Ok(Period::new(start, finish)),
        (Some(start), Some(finish)) => {
            tracing::error!(%start, %finish, "invalid request: empty booking period");
            field_errors.insert("finish".to_string(), "must be after start".to_string());
        }
        (None, _) => {
            field_errors.insert("start".to_string(), "not set".to_string());
        }
        (_, None) => {
            field_errors.insert("finish".to_string(), "not set".to_string());
        }
    }
    Err(ApiError::validation_error(field_errors))
}

/// GET /reservation/places?start=..&finish=.. - availability of every place
#[tracing::instrument(name = "handlers.actual_places", skip_all)]
pub async fn actual_places(
    State(state): State<AppState>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<PlacesResponse> {
    let Query(query) = query.map_err(|e| {
        tracing::error!("invalid period query: {}", e);
        ApiError::bad_request("invalid period")
    })?;

    if query.finish < query.start {
        tracing::error!(start = %query.start, finish = %query.finish, "invalid period query");
        return Err(ApiError::bad_request("invalid period"));
    }

    let places = state
        .store
        .get_actual_places(Period::new(query.start, query.finish))
        .await
        .map_err(|e| {
            tracing::error!("failed to get place list: {}", e);
            ApiError::unprocessable_entity("failed to get place list")
        })?;

    tracing::info!(count = places.len(), "place list gotten");

    Ok(ApiResponse::success(PlacesResponse { places }))
}

/// GET /reservation/places/:place_id - name of one place
#[tracing::instrument(name = "handlers.place_name", skip_all)]
pub async fn place_name(
    State(state): State<AppState>,
    path: Result<Path<PlaceId>, PathRejection>,
) -> ApiResult<PlaceResponse> {
    let Path(place_id) = path.map_err(|e| {
        tracing::error!("invalid place id: {}", e);
        ApiError::bad_request("invalid place id")
    })?;

    let name = state.store.get_place_name(place_id).await.map_err(|e| {
        tracing::error!("failed to get place name: {}", e);
        ApiError::unprocessable_entity("failed to get place")
    })?;

    let Some(name) = name else {
        tracing::warn!(place_id, "place not found");
        return Err(ApiError::unprocessable_entity("place not found"));
    };

    Ok(ApiResponse::success(PlaceResponse {
        place: Place {
            place_id,
            name,
            ..Default::default()
        },
    }))
}

/// GET /reservation/my - the caller's reservations, newest start first
#[tracing::instrument(name = "handlers.my_reservations", skip_all)]
pub async fn my_reservations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<ReservationsResponse> {
    let reservations = state
        .store
        .get_reservations_by_user_id(principal.user_id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = principal.user_id, "failed to get reservations: {}", e);
            ApiError::unprocessable_entity("failed to get reservations")
        })?;

    Ok(ApiResponse::success(ReservationsResponse { reservations }))
}

/// POST /reservation - book a place for the caller
///
/// Refused when the place is booked by anyone for an overlapping period, and otherwise
/// when the caller already holds a reservation in the period. A taken place wins when
/// both hold.
#[tracing::instrument(name = "handlers.add_reservation", skip_all)]
pub async fn add_reservation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ValidatedJson(req): ValidatedJson<AddReservationRequest>,
) -> ApiResult<()> {
    tracing::info!(place_id = req.place_id, "request body decoded");
    let period = booking_period(req.start, req.finish)?;

    let place_taken = state
        .store
        .is_place_taken(req.place_id, period)
        .await
        .map_err(|e| {
            tracing::error!("failed to check place reservations: {}", e);
            ApiError::unprocessable_entity("failed to add reservation")
        })?;

    if place_taken {
        tracing::warn!(place_id = req.place_id, "place is already taken");
        return Err(ApiError::unprocessable_entity("place is already taken"));
    }

    let already_booked = state
        .store
        .has_user_reservation_in_date_range(principal.user_id, period)
        .await
        .map_err(|e| {
            tracing::error!("failed to check user reservations: {}", e);
            ApiError::unprocessable_entity("failed to add reservation")
        })?;

    if already_booked {
        tracing::warn!(user_id = principal.user_id, "user already has a reservation in this period");
        return Err(ApiError::unprocessable_entity(
            "user already has a reservation in this period",
        ));
    }

    let reservation = NewReservation {
        place_id: req.place_id,
        user_id: principal.user_id,
        period,
    };

    match state.store.insert_reservation(reservation).await {
        Ok(()) => {}
        Err(StoreError::PlaceTaken) => {
            tracing::warn!(place_id = req.place_id, "place is already taken");
            return Err(ApiError::unprocessable_entity("place is already taken"));
        }
        Err(e) => {
            tracing::error!("failed to add reservation: {}", e);
            return Err(ApiError::unprocessable_entity("failed to add reservation"));
        }
    }

    tracing::info!(place_id = req.place_id, user_id = principal.user_id, "reservation added");

    Ok(ApiResponse::ok())
}

/// PUT /reservation - move a reservation to another place or period
///
/// Applied unconditionally: no ownership check, no overlap re-validation.
#[tracing::instrument(name = "handlers.update_reservation", skip_all)]
pub async fn update_reservation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateReservationRequest>,
) -> ApiResult<()> {
    tracing::info!(reservation_id = req.reservation_id, "request body decoded");
    let period = booking_period(req.start, req.finish)?;

    state
        .store
        .update_reservation(req.reservation_id, req.place_id, period)
        .await
        .map_err(|e| {
            tracing::error!("failed to update reservation: {}", e);
            ApiError::unprocessable_entity("failed to update reservation")
        })?;

    tracing::info!(reservation_id = req.reservation_id, "reservation updated");

    Ok(ApiResponse::ok())
}

/// DELETE /reservation - cancel a reservation
#[tracing::instrument(name = "handlers.delete_reservation", skip_all)]
pub async fn delete_reservation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteReservationRequest>,
) -> ApiResult<()> {
    state
        .store
        .delete_reservation(req.reservation_id)
        .await
        .map_err(|e| {
            tracing::error!("failed to delete reservation: {}", e);
            ApiError::unprocessable_entity("failed to delete reservation")
        })?;

    tracing::info!(reservation_id = req.reservation_id, "reservation deleted");

    Ok(ApiResponse::ok())
}

//! Entity operations behind the HTTP handlers.
//!
//! [`PortalStore`] is the seam between handlers and storage. The production
//! implementation ([`postgres::PgStore`]) runs one or two parameterized statements per
//! operation against a shared `PgPool`. Unit tests use the in-memory `StoreMock`.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthenticatedUser;
use crate::database::models::{ActualPlace, NewReservation, Reservation};
use crate::period::Period;
use crate::types::{ItemId, PlaceId, ReservationId, UserId};

pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another reservation of the place overlaps the requested period
    #[error("place is already taken")]
    PlaceTaken,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError>;

    /// Check a login and password.
    ///
    /// Returns `Ok(None)` both for an unknown login and for a wrong password.
    async fn user_auth(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, StoreError>;

    /// Availability of every place for `period`, ordered by `place_id`.
    ///
    /// Places without an overlapping reservation appear once, available. Places with
    /// overlapping reservations appear once per distinct reservation, unavailable.
    async fn get_actual_places(&self, period: Period) -> Result<Vec<ActualPlace>, StoreError>;

    async fn get_place_name(&self, place_id: PlaceId) -> Result<Option<String>, StoreError>;

    /// Whether any reservation of the place overlaps `period`
    async fn is_place_taken(&self, place_id: PlaceId, period: Period) -> Result<bool, StoreError>;

    async fn has_user_reservation_in_date_range(
        &self,
        user_id: UserId,
        period: Period,
    ) -> Result<bool, StoreError>;

    /// Insert a reservation unless the place is already booked for an overlapping period.
    ///
    /// The check and the insert are separate statements; concurrent callers can both
    /// pass the check.
    async fn insert_reservation(&self, reservation: NewReservation) -> Result<(), StoreError>;

    async fn update_reservation(
        &self,
        reservation_id: ReservationId,
        place_id: PlaceId,
        period: Period,
    ) -> Result<(), StoreError>;

    async fn delete_reservation(&self, reservation_id: ReservationId) -> Result<(), StoreError>;

    /// All reservations of the user, newest start first
    async fn get_reservations_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, StoreError>;
}

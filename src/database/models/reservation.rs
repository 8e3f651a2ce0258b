use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::period::Period;
use crate::types::{PlaceId, ReservationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub place_id: PlaceId,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub user_id: UserId,
}

impl Reservation {
    pub fn period(&self) -> Period {
        Period::new(self.start, self.finish)
    }
}

/// Input of [`crate::store::PortalStore::insert_reservation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub place_id: PlaceId,
    pub user_id: UserId,
    pub period: Period,
}

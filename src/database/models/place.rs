use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::period::serialize_unix_millis;
use crate::types::{PlaceId, UserId};

/// A bookable workplace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct Place {
    pub place_id: PlaceId,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub internet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub second_screen: String,
}

/// Availability of a place for one queried period.
///
/// Available rows carry `user_id = 0` and the zero timestamp; unavailable rows carry the
/// blocking reservation's user and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ActualPlace {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub place: Place,
    pub is_available: bool,
    pub user_id: UserId,
    #[serde(serialize_with = "serialize_unix_millis")]
    pub start: NaiveDateTime,
    #[serde(serialize_with = "serialize_unix_millis")]
    pub finish: NaiveDateTime,
}

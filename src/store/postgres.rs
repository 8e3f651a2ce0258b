use async_trait::async_trait;
use sqlx::PgPool;

use super::{PortalStore, StoreError};
use crate::auth::{verify_password, AuthenticatedUser};
use crate::database::models::{ActualPlace, NewReservation, Reservation, UserCredentials};
use crate::period::Period;
use crate::types::{ItemId, PlaceId, ReservationId, UserId};

// Every place marked available, minus the ones booked in the period, plus one
// unavailable row per booking in the period.
const SQL_GET_ACTUAL_PLACES: &str = r#"
    (SELECT place_id, "name", COALESCE(phone, '') AS phone, COALESCE(internet, '') AS internet,
            COALESCE(second_screen, '') AS second_screen, true AS is_available, 0 AS user_id,
            TIMESTAMP '0001-01-01 00:00:00' AS "start", TIMESTAMP '0001-01-01 00:00:00' AS finish
       FROM place
     EXCEPT
     SELECT DISTINCT place_id, "name", COALESCE(phone, ''), COALESCE(internet, ''),
            COALESCE(second_screen, ''), true, 0,
            TIMESTAMP '0001-01-01 00:00:00', TIMESTAMP '0001-01-01 00:00:00'
       FROM place_and_reservation
      WHERE ($1::timestamp, $2::timestamp) OVERLAPS ("start", finish))
    UNION
    (SELECT DISTINCT place_id, "name", COALESCE(phone, ''), COALESCE(internet, ''),
            COALESCE(second_screen, ''), false AS is_available, user_id, "start", finish
       FROM place_and_reservation
      WHERE ($1::timestamp, $2::timestamp) OVERLAPS ("start", finish))
    ORDER BY place_id
"#;

const SQL_GET_RESERVATIONS_BY_USER_ID: &str = r#"
    SELECT reservation_id, place_id, "start", finish, user_id
      FROM reservation
     WHERE user_id = $1
     ORDER BY "start" DESC
"#;

const SQL_GET_USER_RESERVATION_IN_DATE_RANGE: &str = r#"
    SELECT reservation_id FROM reservation
     WHERE user_id = $1 AND ("start", finish) OVERLAPS ($2::timestamp, $3::timestamp)
     LIMIT 1
"#;

const SQL_GET_IS_PLACE_TAKEN: &str = r#"
    SELECT reservation_id FROM reservation
     WHERE place_id = $1 AND ("start", finish) OVERLAPS ($2::timestamp, $3::timestamp)
     LIMIT 1
"#;

const SQL_GET_NAME_BY_PLACE_ID: &str = r#"SELECT "name" FROM place WHERE place_id = $1"#;

const SQL_GET_USER_CREDENTIALS: &str = r#"
    SELECT user_id, username, role, password_hash FROM users WHERE login = $1
"#;

const SQL_INSERT_RESERVATION: &str = r#"
    INSERT INTO reservation (place_id, user_id, "start", finish) VALUES ($1, $2, $3, $4)
"#;

const SQL_UPDATE_RESERVATION: &str = r#"
    UPDATE reservation SET place_id = $2, "start" = $3, finish = $4 WHERE reservation_id = $1
"#;

const SQL_DELETE_RESERVATION: &str = "DELETE FROM reservation WHERE reservation_id = $1";

const SQL_DELETE_ITEM: &str = "DELETE FROM item WHERE item_id = $1";

/// [`PortalStore`] backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PortalStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_item(&self, item_id: ItemId) -> Result<(), StoreError> {
        sqlx::query(SQL_DELETE_ITEM)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_auth(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<AuthenticatedUser>, StoreError> {
        let row: Option<UserCredentials> = sqlx::query_as(SQL_GET_USER_CREDENTIALS)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .filter(|user| verify_password(password, &user.password_hash))
            .map(AuthenticatedUser::from))
    }

    async fn get_actual_places(&self, period: Period) -> Result<Vec<ActualPlace>, StoreError> {
        let places = sqlx::query_as::<_, ActualPlace>(SQL_GET_ACTUAL_PLACES)
            .bind(period.start())
            .bind(period.finish())
            .fetch_all(&self.pool)
            .await?;
        Ok(places)
    }

    async fn get_place_name(&self, place_id: PlaceId) -> Result<Option<String>, StoreError> {
        let name: Option<(String,)> = sqlx::query_as(SQL_GET_NAME_BY_PLACE_ID)
            .bind(place_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name.map(|(name,)| name))
    }

    async fn has_user_reservation_in_date_range(
        &self,
        user_id: UserId,
        period: Period,
    ) -> Result<bool, StoreError> {
        let hit: Option<(ReservationId,)> = sqlx::query_as(SQL_GET_USER_RESERVATION_IN_DATE_RANGE)
            .bind(user_id)
            .bind(period.start())
            .bind(period.finish())
            .fetch_optional(&self.pool)
            .await?;
        Ok(hit.is_some())
    }

    async fn is_place_taken(&self, place_id: PlaceId, period: Period) -> Result<bool, StoreError> {
        let hit: Option<(ReservationId,)> = sqlx::query_as(SQL_GET_IS_PLACE_TAKEN)
            .bind(place_id)
            .bind(period.start())
            .bind(period.finish())
            .fetch_optional(&self.pool)
            .await?;
        Ok(hit.is_some())
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> Result<(), StoreError> {
        if self.is_place_taken(reservation.place_id, reservation.period).await? {
            return Err(StoreError::PlaceTaken);
        }

        // TODO: run the check and the insert in one SERIALIZABLE transaction, or add an
        // exclusion constraint on (place_id, tsrange(start, finish)), once double booking
        // under concurrent requests is confirmed to be a bug rather than accepted.
        sqlx::query(SQL_INSERT_RESERVATION)
            .bind(reservation.place_id)
            .bind(reservation.user_id)
            .bind(reservation.period.start())
            .bind(reservation.period.finish())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_reservation(
        &self,
        reservation_id: ReservationId,
        place_id: PlaceId,
        period: Period,
    ) -> Result<(), StoreError> {
        sqlx::query(SQL_UPDATE_RESERVATION)
            .bind(reservation_id)
            .bind(place_id)
            .bind(period.start())
            .bind(period.finish())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_reservation(&self, reservation_id: ReservationId) -> Result<(), StoreError> {
        sqlx::query(SQL_DELETE_RESERVATION)
            .bind(reservation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_reservations_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = sqlx::query_as::<_, Reservation>(SQL_GET_RESERVATIONS_BY_USER_ID)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }
}

pub mod place;
pub mod reservation;
pub mod user;

pub use place::{ActualPlace, Place};
pub use reservation::{NewReservation, Reservation};
pub use user::UserCredentials;

// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, so handlers receive the caller
// as an `Extension<Principal>` argument.

pub mod me;
pub mod reservation;
pub mod shop;

pub use me::me;
pub use reservation::{
    actual_places, add_reservation, delete_reservation, my_reservations, place_name,
    update_reservation,
};
pub use shop::delete_item;

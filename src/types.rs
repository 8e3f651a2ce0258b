/// Shared types used across the codebase

use serde::{Serialize, Serializer};
use std::fmt;

pub type UserId = i32;
pub type PlaceId = i32;
pub type ItemId = i32;
pub type ReservationId = i32;

/// Role code carried in the `role` token claim and the `users.role` column.
///
/// Code `0` is the "no role" value; the auth layer rejects tokens carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    SuperAdmin,
    ShopEditor,
    ReservationEditor,
    Employee,
    Other(i32),
}

impl Role {
    pub fn code(self) -> i32 {
        match self {
            Role::SuperAdmin => 1,
            Role::ShopEditor => 2,
            Role::ReservationEditor => 3,
            Role::Employee => 4,
            Role::Other(code) => code,
        }
    }
}

impl From<i32> for Role {
    fn from(code: i32) -> Self {
        match code {
            1 => Role::SuperAdmin,
            2 => Role::ShopEditor,
            3 => Role::ReservationEditor,
            4 => Role::Employee,
            other => Role::Other(other),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::SuperAdmin => write!(f, "super_admin"),
            Role::ShopEditor => write!(f, "shop_editor"),
            Role::ReservationEditor => write!(f, "reservation_editor"),
            Role::Employee => write!(f, "employee"),
            Role::Other(code) => write!(f, "role#{}", code),
        }
    }
}

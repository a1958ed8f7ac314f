//! Domain entities and persistence for the expense tracker. Every operation takes a grant from
//! [`auth`], which scopes it to the user that owns the data.

pub mod amount;
pub mod auth;
pub mod database;
pub mod error;
pub mod expense;
mod hex;
pub mod monthly;
pub mod period;
pub mod user;

pub use amount::Amount;
pub use error::ErrorKind;
pub use period::Period;

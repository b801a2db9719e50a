//! Database models split into domain-specific modules.

pub mod lot;
pub mod reservation;
pub mod spot;
pub mod user;

pub use lot::*;
pub use reservation::*;
pub use spot::*;
pub use user::*;

//! Data model for the session core.

mod club;
mod role;
mod user;

pub use club::Club;
pub use role::{select_current_role, CategoryRef, RoleAssignment, ROLE_PLAYER};
pub use user::{MeResponse, UserProfile};

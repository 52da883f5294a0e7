//! SeaORM entity definitions.

pub mod admin_user;
pub mod priority;
pub mod priority_message;
pub mod user;

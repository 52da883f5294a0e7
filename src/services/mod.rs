//! Business logic services.

pub mod admin_directory;
pub mod archive;
pub mod lifecycle;
pub mod priority;
pub mod slurm;
pub mod validation;

pub use admin_directory::{AdminDirectory, DbAdminDirectory, StaticAdminDirectory};
pub use priority::PriorityService;

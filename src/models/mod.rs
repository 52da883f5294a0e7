//! Domain models for the GPU priority service.

pub mod admin_user;
pub mod priority;
pub mod user;

// Re-export commonly used types
pub use admin_user::AdminUser;
pub use priority::{
    AcceptPriorityRequest, AddMessageRequest, AdminMessage, GpuType, ListPrioritiesQuery,
    MessageLog, NewPriorityRequest, PriorityListResponse, PriorityRequest, PriorityResponse,
    PriorityStatus, RequestState, StatusChangeRequest, SubmitPriorityRequest, UpdateUsersRequest,
};
pub use user::{IdentityClaims, User, UserResponse};

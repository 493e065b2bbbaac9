pub mod auth;

pub use auth::{authorize, guard_middleware, AccessDenied, AuthUser, RoleRequirement};

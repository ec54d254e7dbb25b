pub mod admin;
pub mod auth;
pub mod dto;
mod entry;
pub mod users;

pub use crate::auth::{AdminRole, CustomerRole, RequiredRole, RestaurantRole};
pub use crate::middleware::{
    AuthGuard, AuthRoleGuard, catch_panic_layer, json_error_middleware,
};
pub use crate::response::{ApiResult, JsonApiResponse};
pub use entry::{API_PREFIX, router};

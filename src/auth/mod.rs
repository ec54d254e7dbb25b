pub mod jwt;
pub mod password;
pub mod roles;
mod types;

pub use jwt::TokenService;
pub use roles::roles_for;
pub use types::{
    AdminRole, Claims, CustomerRole, IssuedToken, Principal, RequiredRole, RestaurantRole, Role,
};

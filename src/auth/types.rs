use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Restaurant,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Restaurant => "restaurant",
            Role::Customer => "customer",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "restaurant" => Ok(Role::Restaurant),
            "customer" => Ok(Role::Customer),
            _ => Err(()),
        }
    }
}

pub trait RequiredRole {
    fn required() -> Role;
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn required() -> Role {
        Role::Admin
    }
}

pub struct RestaurantRole;

impl RequiredRole for RestaurantRole {
    fn required() -> Role {
        Role::Restaurant
    }
}

pub struct CustomerRole;

impl RequiredRole for CustomerRole {
    fn required() -> Role {
        Role::Customer
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // normalized email
    pub aid: Uuid,   // account id
    pub roles: Vec<Role>,
    pub sid: String, // session id
    pub iat: usize,
    pub exp: usize,
}

/// The authenticated caller, passed explicitly down the call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub session_id: String,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.aid,
            email: claims.sub,
            roles: claims.roles,
            session_id: claims.sid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session_id: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    /// Same as the token's `exp` claim.
    pub expires_at: usize,
}

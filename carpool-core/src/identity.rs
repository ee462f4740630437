use carpool_shared::Masked;
use uuid::Uuid;

use crate::user::{User, UserRole};

/// The verified caller of one request, resolved by the auth middleware and
/// handed to handlers explicitly.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Masked<String>,
    pub name: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_driver(&self) -> bool {
        self.role == UserRole::Driver
    }

    /// Admins act on anyone's behalf.
    pub fn can_act_for(&self, user_id: Uuid) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: Masked(user.email.clone()),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

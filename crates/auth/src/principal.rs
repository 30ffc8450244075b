use storefront_core::UserId;

use crate::{JwtClaims, Role};

/// Identity of whoever issued the current request.
///
/// A request without a bearer token is served as [`Caller::anonymous`]; an
/// anonymous caller never holds roles, so it can never be an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: Option<UserId>,
    roles: Vec<Role>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            roles: Vec::new(),
        }
    }

    pub fn authenticated(user_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            user_id: Some(user_id),
            roles,
        }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self::authenticated(claims.sub, claims.roles.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.roles.iter().any(Role::is_admin)
    }

    /// Whether this caller wrote the resource owned by `author`.
    pub fn is_author_of(&self, author: UserId) -> bool {
        self.user_id == Some(author)
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::anonymous()
    }
}

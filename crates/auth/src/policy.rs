//! Access policy table: which capabilities an action on a resource requires.
//!
//! The table is a closed `match` over every `(Resource, Action)` pair. Public
//! rows are spelled out rather than falling through a wildcard, so adding a
//! variant to either enum fails to compile until somebody decides who may use it.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use storefront_core::UserId;

use crate::Caller;

/// Resource types exposed through the API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Review,
    Order,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Product, Resource::Review, Resource::Order];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Product => "product",
            Resource::Review => "review",
            Resource::Order => "order",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD actions plus the `reviews` sub-resource action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
    /// List every review of one product.
    Reviews,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::PartialUpdate,
        Action::Destroy,
        Action::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::Destroy => "destroy",
            Action::Reviews => "reviews",
        }
    }

    /// Actions that change stored state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Action::Create | Action::Update | Action::PartialUpdate | Action::Destroy
        )
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

/// A precondition that must hold before an action proceeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The caller presented a valid identity.
    Authenticated,
    /// The caller holds the `admin` role.
    Administrator,
    /// The caller wrote the target resource, or is an administrator.
    AuthorOrAdministrator,
}

impl Capability {
    /// Evaluate against a caller. `author` is the owner of the target resource
    /// when the action targets an existing one.
    pub fn is_satisfied_by(&self, caller: &Caller, author: Option<UserId>) -> bool {
        match self {
            Capability::Authenticated => caller.is_authenticated(),
            Capability::Administrator => caller.is_admin(),
            Capability::AuthorOrAdministrator => {
                caller.is_admin() || author.is_some_and(|a| caller.is_author_of(a))
            }
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Capability::Authenticated => "authenticated",
            Capability::Administrator => "administrator",
            Capability::AuthorOrAdministrator => "author_or_administrator",
        })
    }
}

const PUBLIC: &[Capability] = &[];
const AUTHENTICATED: &[Capability] = &[Capability::Authenticated];
const ADMIN_ONLY: &[Capability] = &[Capability::Administrator];
const AUTHOR_OR_ADMIN: &[Capability] = &[
    Capability::Authenticated,
    Capability::AuthorOrAdministrator,
];

/// Capabilities that must **all** hold for `action` on `resource`.
///
/// An empty slice means the action is public.
pub fn required_capabilities(resource: Resource, action: Action) -> &'static [Capability] {
    use Action::*;

    match (resource, action) {
        (Resource::Product, List | Retrieve | Reviews) => PUBLIC,
        (Resource::Product, Create | Update | PartialUpdate | Destroy) => ADMIN_ONLY,

        (Resource::Review, List | Retrieve | Reviews) => PUBLIC,
        (Resource::Review, Create) => AUTHENTICATED,
        (Resource::Review, Update | PartialUpdate | Destroy) => AUTHOR_OR_ADMIN,

        (Resource::Order, List | Retrieve | Create) => AUTHENTICATED,
        (Resource::Order, Update | PartialUpdate | Destroy) => ADMIN_ONLY,
        (Resource::Order, Reviews) => PUBLIC,
    }
}

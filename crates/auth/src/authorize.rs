use thiserror::Error;

use storefront_core::UserId;

use crate::{Action, Caller, Capability, Resource, required_capabilities};

/// Why an action was refused.
///
/// `Unauthenticated` maps to 401 and `PermissionDenied` to 403 at the
/// transport boundary; this crate only produces the verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("authentication required for {resource}.{action}")]
    Unauthenticated { resource: Resource, action: Action },

    #[error("forbidden: {resource}.{action} requires {missing}")]
    PermissionDenied {
        resource: Resource,
        action: Action,
        missing: Capability,
    },
}

/// Decide whether `caller` may perform `action` on `resource`.
///
/// `author` is the author of the targeted resource (only meaningful for review
/// mutation). Pure function:
/// - No IO
/// - No panics
pub fn authorize(
    caller: &Caller,
    resource: Resource,
    action: Action,
    author: Option<UserId>,
) -> Result<(), AccessDenied> {
    let unmet = required_capabilities(resource, action)
        .iter()
        .find(|cap| !cap.is_satisfied_by(caller, author));

    match unmet {
        None => Ok(()),
        Some(_) if !caller.is_authenticated() => {
            Err(AccessDenied::Unauthenticated { resource, action })
        }
        Some(&missing) => Err(AccessDenied::PermissionDenied {
            resource,
            action,
            missing,
        }),
    }
}

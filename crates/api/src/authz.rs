//! API-side authorization guard.
//!
//! Every handler calls into this module before touching storage, so the
//! verdict always comes from the one access policy in `storefront-auth`.

use storefront_auth::{AccessDenied, Action, Caller, Resource, authorize};
use storefront_core::UserId;

/// Check `action` on `resource` for the current caller.
///
/// `author` is the author of the targeted object, when there is one.
pub fn authorize_request(
    caller: &Caller,
    resource: Resource,
    action: Action,
    author: Option<UserId>,
) -> Result<(), AccessDenied> {
    authorize(caller, resource, action, author).inspect_err(|denied| {
        tracing::debug!(
            user_id = ?caller.user_id(),
            resource = %resource,
            action = %action,
            reason = %denied,
            "access denied"
        );
    })
}

/// Reject anonymous callers before an object lookup.
///
/// Object-level checks need the target loaded first; an anonymous caller gets
/// 401 for a non-public action whether or not the target exists.
pub fn require_identity(caller: &Caller, resource: Resource, action: Action) -> Result<(), AccessDenied> {
    if caller.is_authenticated() {
        return Ok(());
    }
    authorize_request(caller, resource, action, None)
}

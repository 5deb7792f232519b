/// Authorization for chamber administrators.
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, AdminCapability};
///
/// Actor::new(session.user_id(), session.is_admin())
///     .can(AdminCapability::ReviewReceipts)
///     .check(deps)
///     .await?;
/// ```
mod builder;
mod capability;
mod errors;

pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
pub use capability::AdminCapability;
pub use errors::AuthError;

//! Identity and session management for the console.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
pub mod authorizer;
pub mod validation;

pub use principal::{Identity, IdentityRecord, Permission, Role};
pub use session::SessionStore;
pub use provider::{IdentityProvider, RemoteIdentityProvider, SignupRequest, StaticIdentityProvider, USERS_COLLECTION};
pub use authorizer::{can, Action};

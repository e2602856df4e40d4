//! Role-scoped object store sessions.

use async_trait::async_trait;
use lr_error::Result;
use std::sync::Arc;

use crate::ObjectStore;

/// An object store bound to the credentials of one assumed role.
///
/// A session lives for one call chain (one production root, one task) and is
/// never shared between tasks of different roles.
#[derive(Clone)]
pub struct RoleSession {
    /// The assumed role
    pub role: String,

    /// Region the session operates in
    pub region: String,

    /// Store authorized as `role`
    pub store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for RoleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleSession")
            .field("role", &self.role)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Hands out role-scoped sessions.
///
/// Implementations own credential refresh: the store inside a session must
/// keep working past the expiry of the first set of temporary credentials.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Assumes `role` and returns a store authorized as that role.
    async fn assume(&self, role: &str) -> Result<RoleSession>;
}

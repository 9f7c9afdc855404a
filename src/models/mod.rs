pub mod contractor;
pub mod job;
pub mod payment;
pub mod pricing;
pub mod rating;
pub mod surge;
pub mod user;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization a row belongs to. Every store access is scoped by one of
/// these; rows never cross tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

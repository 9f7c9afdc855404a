use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::TenantId;
use crate::models::user::Role;

/// Identity asserted by the upstream auth layer via headers. This service
/// trusts the gateway; it only enforces tenancy and capabilities.
#[derive(Debug, Clone)]
pub struct Caller {
    pub tenant_id: TenantId,
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
}

impl Caller {
    /// Capability check, done once at the handler boundary.
    pub fn require_role(&self, allowed: &[Role]) -> Result<Role, AppError> {
        let role = self
            .role
            .ok_or_else(|| AppError::Forbidden("x-role header required".to_string()))?;

        if allowed.contains(&role) {
            Ok(role)
        } else {
            Err(AppError::Forbidden(format!(
                "role {} may not perform this operation",
                role.as_str()
            )))
        }
    }

    pub fn require_user(&self) -> Result<Uuid, AppError> {
        self.user_id
            .ok_or_else(|| AppError::Forbidden("x-user-id header required".to_string()))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    match parts.headers.get(name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::validation(name, "header is not valid ascii")),
        None => Ok(None),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = header_str(parts, "x-tenant-id")?
            .ok_or_else(|| AppError::validation("x-tenant-id", "header required"))?
            .parse::<Uuid>()
            .map(TenantId)
            .map_err(|_| AppError::validation("x-tenant-id", "not a valid uuid"))?;

        let user_id = header_str(parts, "x-user-id")?
            .map(|raw| {
                raw.parse::<Uuid>()
                    .map_err(|_| AppError::validation("x-user-id", "not a valid uuid"))
            })
            .transpose()?;

        let role = header_str(parts, "x-role")?
            .map(|raw| {
                raw.parse::<Role>()
                    .map_err(|err| AppError::validation("x-role", err))
            })
            .transpose()?;

        Ok(Caller {
            tenant_id,
            user_id,
            role,
        })
    }
}

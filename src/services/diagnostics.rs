//! Connectivity and permission check for the `status` command.

use crate::services::moysklad::{AccessCheck, AccountingApi};
use crate::types::context::RequestContext;
use crate::types::errors::{ApiError, UpdError, UpdResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id: String,
    pub name: String,
    pub inn: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub can_create_invoices: bool,
    pub can_access_counterparties: bool,
    pub can_access_stores: bool,
    pub stores_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub employee: EmployeeInfo,
    /// The configured organization, else the first one of the account.
    pub organization: OrganizationInfo,
    pub organizations_count: usize,
    pub permissions: Permissions,
    pub base_url: String,
}

/// Employee, organizations, then permission checks. The first two are hard
/// requirements; checks only flip flags.
pub fn status_report(
    ctx: &RequestContext,
    api: &dyn AccountingApi,
    base_url: &str,
    organization_id: Option<&str>,
) -> UpdResult<StatusReport> {
    log::info!("[{}] Verifying MoySklad API access...", ctx.id());

    let employee = api.current_employee().map_err(|e| access_error("/context/employee", e))?;
    let organizations = api
        .list_organizations()
        .map_err(|e| access_error("/entity/organization", e))?;
    let configured = organization_id.and_then(|id| {
        let found = organizations.iter().find(|o| o.id == id);
        if found.is_none() {
            log::warn!(
                "[{}] Configured organization {} not found, using the first one",
                ctx.id(),
                id
            );
        }
        found
    });
    let main = configured.or_else(|| organizations.first()).ok_or_else(|| {
        UpdError::ExternalApiFailure("в учетной записи МойСклад нет организаций".to_string())
    })?;

    let mut permissions = Permissions {
        can_create_invoices: api.can_read(AccessCheck::FactureOut),
        can_access_counterparties: api.can_read(AccessCheck::Counterparty),
        ..Default::default()
    };
    match api.list_stores() {
        Ok(stores) => {
            permissions.can_access_stores = true;
            permissions.stores_count = stores.len();
        }
        Err(e) => log::warn!("[{}] Stores are not accessible: {}", ctx.id(), e),
    }

    Ok(StatusReport {
        employee: EmployeeInfo {
            name: employee.name.unwrap_or_default(),
            email: employee.email.unwrap_or_default(),
        },
        organization: OrganizationInfo {
            id: main.id.clone(),
            name: main.name.clone(),
            inn: main.inn.clone().unwrap_or_default(),
        },
        organizations_count: organizations.len(),
        permissions,
        base_url: base_url.to_string(),
    })
}

/// Token check used before every reconciliation.
pub fn verify_token(ctx: &RequestContext, api: &dyn AccountingApi) -> UpdResult<()> {
    match api.current_employee() {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("[{}] Token verification failed: {}", ctx.id(), e);
            Err(UpdError::ExternalApiFailure(match e {
                ApiError::Status { .. } => "неверный токен API МойСклад".to_string(),
                other => other.to_string(),
            }))
        }
    }
}

fn access_error(endpoint: &str, error: ApiError) -> UpdError {
    let message = match &error {
        ApiError::Transport { message, .. } => format!("сетевая ошибка ({endpoint}): {message}"),
        ApiError::Status { status, body, .. } => {
            format!("нет доступа к {endpoint}: {status} {body}")
        }
        ApiError::Decode { message, .. } => format!("не удалось разобрать ответ {endpoint}: {message}"),
    };
    UpdError::ExternalApiFailure(message)
}

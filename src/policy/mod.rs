// Role-based access control: who may call which operation.
//
// One declarative table maps {resource, action} to the role set allowed to
// invoke it, checked by a single `authorize` call at the top of every
// handler, before any database access. Row-level visibility within an
// allowed operation is the scope module's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

pub mod scope;

pub use scope::TenantScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Technician,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Technician => "technician",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "technician" => Ok(Role::Technician),
            "customer" => Ok(Role::Customer),
            other => Err(ApiError::invalid_field("role", format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Customers,
    Buildings,
    Elevators,
    Technicians,
    TechnicianRequests,
    Contracts,
    Quotations,
    Invoices,
    PricingSettings,
    MaintenanceTemplates,
    MaintenancePlans,
    MaintenanceJobs,
    Tickets,
    Parts,
    PartStocks,
    PartMovements,
    Notifications,
    Alerts,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

const ADMIN_MANAGER: &[Role] = &[Role::Admin, Role::Manager];
const STAFF: &[Role] = &[Role::Admin, Role::Manager, Role::Technician];
const WITH_CUSTOMER: &[Role] = &[Role::Admin, Role::Manager, Role::Customer];
const EVERYONE: &[Role] = &[Role::Admin, Role::Manager, Role::Technician, Role::Customer];
const NOBODY: &[Role] = &[];

/// The capability table. Row visibility within an allowed operation is
/// enforced separately by `TenantScope`.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Customers, Read) => WITH_CUSTOMER,
        (Customers, _) => ADMIN_MANAGER,

        (Buildings, List | Read) => WITH_CUSTOMER,
        (Buildings, _) => ADMIN_MANAGER,

        (Elevators, List | Read) => EVERYONE,
        // state changes are recorded by technicians in the field
        (Elevators, Update) => STAFF,
        (Elevators, _) => ADMIN_MANAGER,

        (Technicians, Read) => STAFF,
        (Technicians, _) => ADMIN_MANAGER,

        // anyone may apply; only back office resolves applications
        (TechnicianRequests, List | Create) => EVERYONE,
        (TechnicianRequests, _) => ADMIN_MANAGER,

        (Contracts, List | Read) => WITH_CUSTOMER,
        (Contracts, _) => ADMIN_MANAGER,

        (Quotations, List | Read | Create) => WITH_CUSTOMER,
        (Quotations, _) => ADMIN_MANAGER,

        (Invoices, List | Read) => WITH_CUSTOMER,
        (Invoices, _) => ADMIN_MANAGER,

        (PricingSettings, _) => ADMIN_MANAGER,

        (MaintenanceTemplates, List | Read) => STAFF,
        (MaintenanceTemplates, _) => ADMIN_MANAGER,

        (MaintenancePlans, List | Read) => STAFF,
        (MaintenancePlans, _) => ADMIN_MANAGER,

        (MaintenanceJobs, List | Read | Update) => STAFF,
        (MaintenanceJobs, _) => ADMIN_MANAGER,

        (Tickets, List | Read | Create | Update) => EVERYONE,
        (Tickets, _) => ADMIN_MANAGER,

        (Parts, List | Read) => STAFF,
        (Parts, _) => ADMIN_MANAGER,

        (PartStocks, List) => STAFF,
        (PartStocks, _) => NOBODY,

        (PartMovements, List | Create) => STAFF,
        (PartMovements, _) => NOBODY,

        // always self-scoped, so every role manages its own
        (Notifications, List | Update | Delete) => EVERYONE,
        (Notifications, _) => NOBODY,

        (Alerts, List) => ADMIN_MANAGER,
        (Alerts, _) => NOBODY,

        (Dashboard, List | Read) => ADMIN_MANAGER,
        (Dashboard, _) => NOBODY,
    }
}

/// The generic role guard. Returns `Forbidden` when the caller's role is
/// not in the allowed set for the operation.
pub fn authorize(role: Role, resource: Resource, action: Action) -> Result<(), ApiError> {
    if allowed_roles(resource, action).contains(&role) {
        Ok(())
    } else {
        tracing::warn!(
            "authorization denied: role={} resource={:?} action={:?}",
            role,
            resource,
            action
        );
        Err(ApiError::forbidden("Insufficient role for this operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_and_rejects_unknown() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("technician".parse::<Role>().unwrap(), Role::Technician);
        assert!("root".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_allowed_everywhere_it_matters() {
        for resource in [
            Resource::Customers,
            Resource::Buildings,
            Resource::Elevators,
            Resource::Contracts,
            Resource::Invoices,
            Resource::Tickets,
        ] {
            for action in [Action::List, Action::Read, Action::Create, Action::Update, Action::Delete] {
                assert!(authorize(Role::Admin, resource, action).is_ok(), "{:?} {:?}", resource, action);
            }
        }
    }

    #[test]
    fn customer_cannot_touch_back_office_resources() {
        assert!(authorize(Role::Customer, Resource::Customers, Action::Create).is_err());
        assert!(authorize(Role::Customer, Resource::PricingSettings, Action::List).is_err());
        assert!(authorize(Role::Customer, Resource::Parts, Action::List).is_err());
        assert!(authorize(Role::Customer, Resource::Alerts, Action::List).is_err());
        assert!(authorize(Role::Customer, Resource::Dashboard, Action::Read).is_err());
        assert!(authorize(Role::Customer, Resource::TechnicianRequests, Action::Update).is_err());
    }

    #[test]
    fn customer_read_paths_are_allowed() {
        assert!(authorize(Role::Customer, Resource::Buildings, Action::List).is_ok());
        assert!(authorize(Role::Customer, Resource::Elevators, Action::List).is_ok());
        assert!(authorize(Role::Customer, Resource::Invoices, Action::Read).is_ok());
        assert!(authorize(Role::Customer, Resource::Tickets, Action::Create).is_ok());
        assert!(authorize(Role::Customer, Resource::Quotations, Action::Create).is_ok());
    }

    #[test]
    fn technician_scope_of_duties() {
        assert!(authorize(Role::Technician, Resource::MaintenanceJobs, Action::Update).is_ok());
        assert!(authorize(Role::Technician, Resource::Elevators, Action::Update).is_ok());
        assert!(authorize(Role::Technician, Resource::PartMovements, Action::Create).is_ok());
        assert!(authorize(Role::Technician, Resource::Contracts, Action::List).is_err());
        assert!(authorize(Role::Technician, Resource::Invoices, Action::List).is_err());
        assert!(authorize(Role::Technician, Resource::MaintenanceJobs, Action::Delete).is_err());
    }

    #[test]
    fn manager_mirrors_admin_on_crud_resources() {
        assert!(authorize(Role::Manager, Resource::Customers, Action::Delete).is_ok());
        assert!(authorize(Role::Manager, Resource::TechnicianRequests, Action::Update).is_ok());
        assert!(authorize(Role::Manager, Resource::Dashboard, Action::Read).is_ok());
    }
}

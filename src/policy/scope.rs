// Row-level multi-tenant visibility.
//
// A scope is derived once per request from the verified claims and bound
// into SQL as an optional uuid parameter:
//
//     WHERE ($1::uuid IS NULL OR t.customer_id = $1)
//
// `None` lifts the filter for unrestricted callers. The nil UUID is the
// fail-closed sentinel: generated ids are v4, so it matches no rows. The
// same parameter must be bound on every verb of a resource, reads and
// writes alike.

use uuid::Uuid;

use super::Role;
use crate::auth::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Back-office caller, no row filter.
    Unrestricted,
    /// Rows whose owning chain resolves to this customer.
    Customer(Uuid),
    /// Rows referencing this technician record.
    Technician(Uuid),
    /// Scoping identity missing from the claims; matches nothing.
    Denied,
}

impl TenantScope {
    /// Scope for tables owned by a customer, directly via a `customer_id`
    /// column or transitively through the building chain. Staff roles are
    /// unrestricted here; the capability table already decides whether they
    /// may invoke the operation at all.
    pub fn customer_owned(claims: &Claims) -> Self {
        match claims.role {
            Role::Admin | Role::Manager | Role::Technician => TenantScope::Unrestricted,
            Role::Customer => match claims.customer_id {
                Some(id) => TenantScope::Customer(id),
                None => TenantScope::Denied,
            },
        }
    }

    /// Scope for tables referencing a technician record. The technician
    /// record id is resolved from the store by the caller; a technician
    /// token without one is denied rather than widened.
    pub fn technician_owned(claims: &Claims, technician_id: Option<Uuid>) -> Self {
        match claims.role {
            Role::Admin | Role::Manager => TenantScope::Unrestricted,
            Role::Technician => match technician_id {
                Some(id) => TenantScope::Technician(id),
                None => TenantScope::Denied,
            },
            Role::Customer => TenantScope::Denied,
        }
    }

    /// Parameter to bind against an owning `customer_id` column.
    pub fn customer_param(&self) -> Option<Uuid> {
        match self {
            TenantScope::Unrestricted => None,
            TenantScope::Customer(id) => Some(*id),
            TenantScope::Technician(_) | TenantScope::Denied => Some(Uuid::nil()),
        }
    }

    /// Parameter to bind against a `technician_id` column.
    pub fn technician_param(&self) -> Option<Uuid> {
        match self {
            TenantScope::Unrestricted => None,
            TenantScope::Technician(id) => Some(*id),
            TenantScope::Customer(_) | TenantScope::Denied => Some(Uuid::nil()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(role: Role, customer_id: Option<Uuid>) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            email: "t@example.com".to_string(),
            name: "T".to_string(),
            role,
            customer_id,
            iat: now,
            exp: now + 3600,
        }
    }

    #[test]
    fn admin_and_manager_are_unrestricted() {
        assert_eq!(TenantScope::customer_owned(&claims(Role::Admin, None)).customer_param(), None);
        assert_eq!(TenantScope::customer_owned(&claims(Role::Manager, None)).customer_param(), None);
    }

    #[test]
    fn customer_binds_own_id() {
        let id = Uuid::new_v4();
        let scope = TenantScope::customer_owned(&claims(Role::Customer, Some(id)));
        assert_eq!(scope, TenantScope::Customer(id));
        assert_eq!(scope.customer_param(), Some(id));
    }

    #[test]
    fn customer_without_id_fails_closed() {
        let scope = TenantScope::customer_owned(&claims(Role::Customer, None));
        assert_eq!(scope, TenantScope::Denied);
        // nil uuid matches no generated rows; the filter is never lifted
        assert_eq!(scope.customer_param(), Some(Uuid::nil()));
    }

    #[test]
    fn technician_binds_own_record_on_job_tables() {
        let tech_id = Uuid::new_v4();
        let scope = TenantScope::technician_owned(&claims(Role::Technician, None), Some(tech_id));
        assert_eq!(scope.technician_param(), Some(tech_id));

        // no technician record resolved: denied, not widened
        let scope = TenantScope::technician_owned(&claims(Role::Technician, None), None);
        assert_eq!(scope.technician_param(), Some(Uuid::nil()));
    }

    #[test]
    fn customer_never_reaches_technician_tables() {
        let id = Uuid::new_v4();
        let scope = TenantScope::technician_owned(&claims(Role::Customer, Some(id)), None);
        assert_eq!(scope, TenantScope::Denied);
        assert_eq!(scope.technician_param(), Some(Uuid::nil()));
    }

    #[test]
    fn cross_column_params_never_widen() {
        // a customer scope bound against a technician column matches nothing
        let scope = TenantScope::Customer(Uuid::new_v4());
        assert_eq!(scope.technician_param(), Some(Uuid::nil()));
        let scope = TenantScope::Technician(Uuid::new_v4());
        assert_eq!(scope.customer_param(), Some(Uuid::nil()));
    }
}

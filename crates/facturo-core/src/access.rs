//! # Access Module
//!
//! Role resolution and the authorization gate.
//!
//! ## Role Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session established (every request re-reads the customer record)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  email == configured admin email?  (trimmed, case-insensitive)         │
//! │       │                                                                 │
//! │       ├── yes ──► Admin   (stored role ignored)                         │
//! │       │                                                                 │
//! │       └── no ───► stored role, or User when absent                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gate Decisions
//! | decision                     | admin        | user      |
//! |------------------------------|--------------|-----------|
//! | list customers               | yes          | no        |
//! | view / edit customer         | any          | own only  |
//! | change role / delete customer| yes, except the configured admin | no |
//! | list / view invoices         | all          | own only  |
//! | create invoice               | any customer | own only  |
//! | change status / delete invoice | yes        | no        |
//! | manage products              | yes          | no        |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Customer, Invoice, Role};

// =============================================================================
// Principal
// =============================================================================

/// The signed-in identity a request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    #[inline]
    pub fn owns(&self, customer_id: &str) -> bool {
        self.uid == customer_id
    }
}

// =============================================================================
// Role Resolver
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RoleResolver {
    admin_email: Option<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RoleResolver {
    /// A blank admin email disables the override.
    pub fn new(admin_email: Option<&str>) -> Self {
        let admin_email = admin_email.map(normalize).filter(|e| !e.is_empty());
        RoleResolver { admin_email }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin == normalize(email))
    }

    /// The configured admin email wins over whatever role is stored.
    pub fn resolve(&self, email: &str, stored_role: Option<Role>) -> Role {
        if self.is_admin_email(email) {
            Role::Admin
        } else {
            stored_role.unwrap_or_default()
        }
    }
}

// =============================================================================
// Access Policy
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    resolver: RoleResolver,
}

impl AccessPolicy {
    pub fn new(resolver: RoleResolver) -> Self {
        AccessPolicy { resolver }
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Builds the principal for a freshly loaded customer record.
    pub fn principal_for(&self, customer: &Customer) -> Principal {
        Principal {
            uid: customer.id.clone(),
            email: customer.email.clone(),
            role: self.resolver.resolve(&customer.email, Some(customer.role)),
        }
    }

    /// Admin-only actions: listing customers, product writes, invoice
    /// status changes and deletes.
    pub fn require_admin(&self, principal: &Principal, action: &str) -> CoreResult<()> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                action: action.to_string(),
            })
        }
    }

    pub fn can_view_customer(&self, principal: &Principal, customer_id: &str) -> bool {
        principal.is_admin() || principal.owns(customer_id)
    }

    pub fn authorize_role_change(
        &self,
        principal: &Principal,
        target: &Customer,
        new_role: Role,
    ) -> CoreResult<()> {
        self.require_admin(principal, "change customer roles")?;
        if new_role != Role::Admin && self.resolver.is_admin_email(&target.email) {
            return Err(CoreError::ProtectedAccount {
                action: "demoted".to_string(),
            });
        }
        Ok(())
    }

    pub fn authorize_customer_delete(&self, principal: &Principal, target: &Customer) -> CoreResult<()> {
        self.require_admin(principal, "delete customers")?;
        if self.resolver.is_admin_email(&target.email) {
            return Err(CoreError::ProtectedAccount {
                action: "deleted".to_string(),
            });
        }
        Ok(())
    }

    /// Which customer's invoices a listing covers. `None` means all.
    ///
    /// Users always see their own; admins see all unless they filter.
    pub fn invoice_scope(&self, principal: &Principal, requested: Option<&str>) -> Option<String> {
        if principal.is_admin() {
            requested.map(str::to_string)
        } else {
            Some(principal.uid.clone())
        }
    }

    /// Passes the invoice through when the principal may see it.
    ///
    /// A denied invoice is indistinguishable from a missing one.
    pub fn guard_invoice(&self, principal: &Principal, invoice: Invoice) -> Option<Invoice> {
        if principal.is_admin() || principal.owns(&invoice.customer_id) {
            Some(invoice)
        } else {
            None
        }
    }

    pub fn authorize_invoice_create(&self, principal: &Principal, customer_id: &str) -> CoreResult<()> {
        if principal.is_admin() || principal.owns(customer_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                action: "create invoices for other customers".to_string(),
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Money, TaxRate};
    use crate::types::InvoiceStatus;
    use chrono::{NaiveDate, Utc};

    const ADMIN: &str = "boss@facturo.test";

    fn policy() -> AccessPolicy {
        AccessPolicy::new(RoleResolver::new(Some(ADMIN)))
    }

    fn principal(uid: &str, role: Role) -> Principal {
        Principal {
            uid: uid.into(),
            email: format!("{uid}@facturo.test"),
            role,
        }
    }

    fn customer(id: &str, email: &str, role: Role) -> Customer {
        Customer {
            id: id.into(),
            name: id.into(),
            email: email.into(),
            phone: String::new(),
            address: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invoice_for(customer_id: &str) -> Invoice {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        Invoice {
            id: "inv-1".into(),
            invoice_number: "FAC-20260101-0001".into(),
            customer_id: customer_id.into(),
            issue_date: date,
            due_date: date,
            items: vec![],
            tax_rate: TaxRate::from_bps(1900),
            discount: Money::zero(),
            status: InvoiceStatus::Pending,
            payment_method: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_email_overrides_stored_role() {
        let resolver = RoleResolver::new(Some(ADMIN));
        assert_eq!(resolver.resolve(ADMIN, Some(Role::User)), Role::Admin);
        assert_eq!(resolver.resolve("  BOSS@Facturo.TEST ", None), Role::Admin);
    }

    #[test]
    fn test_other_emails_use_stored_role() {
        let resolver = RoleResolver::new(Some(ADMIN));
        assert_eq!(resolver.resolve("a@x.io", Some(Role::Admin)), Role::Admin);
        assert_eq!(resolver.resolve("a@x.io", Some(Role::User)), Role::User);
        assert_eq!(resolver.resolve("a@x.io", None), Role::User);
    }

    #[test]
    fn test_blank_admin_email_disables_override() {
        let resolver = RoleResolver::new(Some("   "));
        assert!(!resolver.is_admin_email(""));
        assert_eq!(resolver.resolve("", None), Role::User);
        assert!(!RoleResolver::new(None).is_admin_email(ADMIN));
    }

    #[test]
    fn test_principal_for_applies_override() {
        let p = policy().principal_for(&customer("c1", ADMIN, Role::User));
        assert!(p.is_admin());
        assert_eq!(p.uid, "c1");
    }

    #[test]
    fn test_non_admin_cannot_see_other_invoice() {
        let policy = policy();
        let user = principal("u1", Role::User);
        assert!(policy.guard_invoice(&user, invoice_for("u2")).is_none());
        assert!(policy.guard_invoice(&user, invoice_for("u1")).is_some());

        let admin = principal("a1", Role::Admin);
        assert!(policy.guard_invoice(&admin, invoice_for("u2")).is_some());
    }

    #[test]
    fn test_invoice_scope() {
        let policy = policy();
        let user = principal("u1", Role::User);
        let admin = principal("a1", Role::Admin);

        assert_eq!(policy.invoice_scope(&user, Some("u2")), Some("u1".to_string()));
        assert_eq!(policy.invoice_scope(&admin, None), None);
        assert_eq!(policy.invoice_scope(&admin, Some("u2")), Some("u2".to_string()));
    }

    #[test]
    fn test_customer_visibility_and_admin_actions() {
        let policy = policy();
        let user = principal("u1", Role::User);
        let admin = principal("a1", Role::Admin);

        assert!(policy.can_view_customer(&user, "u1"));
        assert!(!policy.can_view_customer(&user, "u2"));
        assert!(policy.can_view_customer(&admin, "u2"));

        assert!(policy.require_admin(&user, "list customers").is_err());
        assert!(policy.require_admin(&admin, "list customers").is_ok());

        assert!(policy.authorize_invoice_create(&user, "u1").is_ok());
        assert!(policy.authorize_invoice_create(&user, "u2").is_err());
        assert!(policy.authorize_invoice_create(&admin, "u2").is_ok());
    }

    #[test]
    fn test_protected_admin_cannot_be_demoted_or_deleted() {
        let policy = policy();
        let admin = principal("a1", Role::Admin);
        let boss = customer("boss", ADMIN, Role::Admin);
        let other = customer("c2", "c2@x.io", Role::Admin);

        assert!(matches!(
            policy.authorize_role_change(&admin, &boss, Role::User),
            Err(CoreError::ProtectedAccount { .. })
        ));
        assert!(policy.authorize_role_change(&admin, &boss, Role::Admin).is_ok());
        assert!(policy.authorize_role_change(&admin, &other, Role::User).is_ok());

        assert!(matches!(
            policy.authorize_customer_delete(&admin, &boss),
            Err(CoreError::ProtectedAccount { .. })
        ));
        assert!(policy.authorize_customer_delete(&admin, &other).is_ok());

        let user = principal("u1", Role::User);
        assert!(matches!(
            policy.authorize_customer_delete(&user, &other),
            Err(CoreError::Forbidden { .. })
        ));
    }
}

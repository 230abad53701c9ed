//! # Identity Service
//!
//! Sign-up, sign-in and session evaluation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sign_in(email, password)                                               │
//! │       │  customers.get_credentials → argon2 verify                      │
//! │       ▼                                                                 │
//! │  JWT { sub: customer id, email, exp }  ──► cookie "session"             │
//! │                                                                         │
//! │  every request: authenticate(token)                                     │
//! │       │  verify signature + expiry                                      │
//! │       │  re-read customer record (role changes apply immediately)       │
//! │       ▼                                                                 │
//! │  Principal { uid, email, role = RoleResolver::resolve(...) }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use tracing::{debug, info, warn};

use facturo_core::validation::{validate_email, validate_name, validate_password};
use facturo_core::{AccessPolicy, Customer, Principal};
use facturo_db::{Database, NewCustomer};

use crate::auth::{hash_password, verify_password, AuthError, JwtManager};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub principal: Principal,
    pub customer: Customer,
}

#[derive(Debug)]
pub struct IdentityService {
    db: Database,
    jwt: JwtManager,
    policy: AccessPolicy,
}

impl IdentityService {
    pub fn new(db: Database, jwt: JwtManager, policy: AccessPolicy) -> Self {
        IdentityService { db, jwt, policy }
    }

    pub fn session_lifetime_secs(&self) -> i64 {
        self.jwt.lifetime_secs()
    }

    /// Registers a customer. The configured admin email is stored as admin.
    pub async fn sign_up(&self, req: SignupRequest) -> ApiResult<Customer> {
        let email = validate_email(&req.email)?;
        validate_password(&req.password)?;
        validate_name("name", &req.name)?;

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))??;

        let role = self.policy.resolver().resolve(&email, None);
        let customer = self
            .db
            .customers()
            .create(NewCustomer {
                name: req.name,
                email,
                phone: req.phone.trim().to_string(),
                password_hash,
                role,
            })
            .await?;

        info!(id = %customer.id, role = customer.role.as_str(), "Account created");
        Ok(customer)
    }

    /// Checks the password and issues a session token.
    pub async fn sign_in(&self, req: SignInRequest) -> ApiResult<Session> {
        let email = req.email.trim().to_lowercase();

        let Some((customer, hash)) = self.db.customers().get_credentials(&email).await? else {
            warn!(email = %email, "Sign-in for unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        let password = req.password;
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?;

        if !valid {
            warn!(id = %customer.id, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.jwt.generate_session_token(&customer.id, &customer.email)?;
        let principal = self.policy.principal_for(&customer);

        info!(id = %customer.id, role = principal.role.as_str(), "Signed in");
        Ok(Session {
            token,
            principal,
            customer,
        })
    }

    /// Resolves a session token to the principal it acts as.
    ///
    /// The customer record is re-read so role changes and deletions apply
    /// to sessions already issued.
    pub async fn authenticate(&self, token: &str) -> ApiResult<(Principal, Customer)> {
        let claims = self.jwt.validate_token(token)?;

        let customer = self
            .db
            .customers()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                debug!(uid = %claims.sub, "Session for a deleted account");
                ApiError::from(AuthError::InvalidSession("account no longer exists".into()))
            })?;

        Ok((self.policy.principal_for(&customer), customer))
    }
}

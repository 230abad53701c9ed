//! Shared application state, built once in `main` and handed to every
//! handler as `State<Arc<AppState>>`.

use facturo_core::invoice::InvoiceDefaults;
use facturo_core::{AccessPolicy, RoleResolver};
use facturo_db::Database;

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::identity::IdentityService;

#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub identity: IdentityService,
    pub policy: AccessPolicy,
    pub invoice_defaults: InvoiceDefaults,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, db: Database) -> Self {
        let policy = AccessPolicy::new(RoleResolver::new(config.auth.admin_email.as_deref()));
        let jwt = JwtManager::new(&config.auth.session_secret, config.auth.session_lifetime_secs);

        AppState {
            identity: IdentityService::new(db.clone(), jwt, policy.clone()),
            db,
            policy,
            invoice_defaults: config.invoice_defaults(),
            secure_cookies: config.auth.secure_cookies,
        }
    }
}

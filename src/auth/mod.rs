pub mod codes;
pub mod extract;
pub mod password;
pub mod rate_limit;
pub mod tokens;

use crate::config::AppConfig;
use crate::domain::{NewUser, UserRole};
use crate::error::Result;
use crate::storage::Storage;
use rand::Rng;
use tracing::info;

/// Six random digits, zero-padded.
pub fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Make sure the configured default admin account exists. Runs at startup
/// and before seeding; an existing login is left untouched.
pub async fn ensure_admin_exists(storage: &dyn Storage, config: &AppConfig) -> Result<()> {
    if storage
        .get_user_by_login(&config.default_admin_login)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hashed_password = password::hash_password(&config.default_admin_password)?;
    storage
        .create_user(NewUser {
            firstname: config.default_admin_firstname.clone(),
            lastname: config.default_admin_lastname.clone(),
            login: config.default_admin_login.clone(),
            phone: None,
            email: None,
            image_url: None,
            hashed_password,
            role: UserRole::Admin,
            is_verified: true,
        })
        .await?;

    info!("Created default admin account '{}'", config.default_admin_login);
    Ok(())
}

use anyhow::{bail, Result};
use std::sync::Arc;

use library_server::{
    config::AppConfig,
    models::user::{Role, User, UserChanges},
    services::{auth::AuthService, database::Database},
    store::Stores,
};

const USAGE: &str = "usage: create_admin <email> [name] [password]";

/// Promotes an existing account to admin, or creates a new admin account
/// when the email is unknown (name and password are then required).
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(email) = args.next() else {
        bail!(USAGE);
    };
    let name = args.next();
    let password = args.next().or_else(|| std::env::var("ADMIN_PASSWORD").ok());

    let config = AppConfig::load()?;
    let database = Database::new(&config.database.url, &config.database.name).await?;
    database.ensure_indexes().await?;
    let stores = Stores::mongo(&database);

    if let Some(user) = stores.users.find_by_email(&email).await? {
        if user.role == Role::Admin {
            println!("{} is already an admin", email);
            return Ok(());
        }
        let Some(id) = user.id else {
            bail!("stored user {} has no id", email);
        };
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..UserChanges::default()
        };
        stores.users.update(&id, changes).await?;
        println!("✓ Promoted {} to admin", email);
        return Ok(());
    }

    let (Some(name), Some(password)) = (name, password) else {
        bail!("{} is not registered; {}", email, USAGE);
    };

    let auth = AuthService::new(Arc::clone(&stores.users), &config.auth);
    let hash = auth.hash_password(&password).await?;
    let mut user = User::new(name, email.clone(), hash);
    user.role = Role::Admin;
    stores.users.insert(user).await?;

    println!("✓ Created admin account {}", email);
    Ok(())
}

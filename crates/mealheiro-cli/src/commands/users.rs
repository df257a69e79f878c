//! User profile command implementations

use anyhow::Result;
use mealheiro_core::models::NewUser;
use mealheiro_core::Database;

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users yet. Create one with:");
        println!("  mealheiro users register <username> <email> --password <password>");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────────────────────────────────────");

    for user in users {
        let last_login = user
            .last_login
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "   [{}] {:16} │ {:28} │ last login {}",
            user.id,
            user.username,
            user.email,
            last_login
        );
    }

    Ok(())
}

pub fn cmd_users_register(db: &Database, user: NewUser) -> Result<i64> {
    let id = db.register_user(&user)?;
    println!("✅ Registered user '{}' (ID: {})", user.username.trim(), id);
    println!("   Act as this user with: mealheiro --user {} ...", user.username.trim());
    Ok(id)
}

pub fn cmd_users_login(db: &Database, login: &str, password: &str) -> Result<()> {
    match db.authenticate(login, password)? {
        Some(user) => {
            println!("✅ Welcome, {}!", user.display_name());
            Ok(())
        }
        None => anyhow::bail!("Invalid username or password"),
    }
}

pub fn cmd_users_passwd(db: &Database, user_id: i64, current: &str, new: &str) -> Result<()> {
    db.change_password(user_id, current, new)?;
    println!("✅ Password changed.");
    Ok(())
}

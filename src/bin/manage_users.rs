//! CLI tool to manage administrators and users.
//!
//! Usage:
//!   cargo run --bin manage-users -- admin add <username> <email>
//!   cargo run --bin manage-users -- admin remove <username>
//!   cargo run --bin manage-users -- admin list
//!   cargo run --bin manage-users -- user list
//!   cargo run --bin manage-users -- user delete --id <user-id>

use std::env;

use uuid::Uuid;

use gpu_priority_lib::config::Config;
use gpu_priority_lib::db::DbPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    if matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error applying migrations: {}", e);
        std::process::exit(1);
    }

    let group = args[1].as_str();
    let action = args.get(2).map(String::as_str).unwrap_or("");

    match (group, action) {
        ("admin", "add") => {
            let (Some(username), Some(email)) = (args.get(3), args.get(4)) else {
                eprintln!("Error: admin add requires <username> <email>");
                std::process::exit(1);
            };
            add_admin(&pool, username, email).await;
        }
        ("admin", "remove" | "rm") => {
            let Some(username) = args.get(3) else {
                eprintln!("Error: admin remove requires <username>");
                std::process::exit(1);
            };
            remove_admin(&pool, username).await;
        }
        ("admin", "list" | "ls") => list_admins(&pool).await,
        ("user", "list" | "ls") => list_users(&pool).await,
        ("user", "delete") => {
            let id = parse_id_arg(&args);
            delete_user(&pool, id).await;
        }
        _ => {
            eprintln!("Unknown command: {} {}", group, action);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn parse_id_arg(args: &[String]) -> Uuid {
    let mut i = 3;
    while i < args.len() {
        if (args[i] == "--id" || args[i] == "-i") && i + 1 < args.len() {
            return match Uuid::parse_str(&args[i + 1]) {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("Error: invalid user id '{}': {}", args[i + 1], e);
                    std::process::exit(1);
                }
            };
        }
        i += 1;
    }
    eprintln!("Error: --id is required");
    std::process::exit(1);
}

async fn add_admin(pool: &DbPool, username: &str, email: &str) {
    match pool.add_admin(username, email).await {
        Ok(admin) => println!("Administrator {} added ({}).", admin.username, admin.email),
        Err(e) => {
            eprintln!("Error adding administrator: {}", e);
            std::process::exit(1);
        }
    }
}

async fn remove_admin(pool: &DbPool, username: &str) {
    match pool.remove_admin(username).await {
        Ok(true) => println!("Administrator {} removed.", username),
        Ok(false) => {
            eprintln!("{} is not an administrator.", username);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error removing administrator: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_admins(pool: &DbPool) {
    let admins = match pool.list_admins().await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error listing administrators: {}", e);
            std::process::exit(1);
        }
    };

    if admins.is_empty() {
        println!("No administrators found.");
        return;
    }

    println!();
    println!("{:<24} {:<36} {:<20}", "USERNAME", "EMAIL", "SINCE");
    println!("{}", "-".repeat(80));
    for admin in admins {
        println!(
            "{:<24} {:<36} {:<20}",
            admin.username,
            admin.email,
            admin.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
}

async fn list_users(pool: &DbPool) {
    let users = match pool.list_users().await {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error listing users: {}", e);
            std::process::exit(1);
        }
    };

    if users.is_empty() {
        println!("No users found.");
        return;
    }

    println!();
    println!("{:<36} {:<24} {:<36}", "ID", "USERNAME", "EMAIL");
    println!("{}", "-".repeat(96));
    for user in users {
        println!("{:<36} {:<24} {:<36}", user.id, user.username, user.email);
    }
    println!();
}

async fn delete_user(pool: &DbPool, id: Uuid) {
    match pool.delete_user(id).await {
        Ok(true) => println!("User {} and their priority requests deleted.", id),
        Ok(false) => {
            eprintln!("User {} not found.", id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error deleting user: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-users <group> <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  admin add <username> <email>   Grant administrator capability");
    eprintln!("  admin remove <username>        Revoke administrator capability");
    eprintln!("  admin list                     List administrators");
    eprintln!("  user list                      List users");
    eprintln!("  user delete --id <id>          Delete a user and their requests");
    eprintln!("  help                           Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  manage-users admin add jdoe jdoe@example.org");
    eprintln!("  manage-users user delete --id 550e8400-e29b-41d4-a716-446655440000");
    eprintln!();
}

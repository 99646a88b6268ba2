//! Hash a plain-text password and store it for an admin.
//!
//! Usage: `hash-admin-password <username> <password>`
//!
//! Needs `ZARODA_API_URL` (base URL of a running server) and
//! `SERVICE_ROLE_KEY` (the server's maintenance key). Keep the key secret and
//! run this only from a trusted machine.

use anyhow::Context;
use serde_json::{json, Value};
use std::process::ExitCode;

const USAGE: &str = "Usage: hash-admin-password <username> <password>";
const BCRYPT_COST: u32 = 10;

enum Failure {
    /// The server refused or could not apply the update.
    Update(String),
    Unexpected(anyhow::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, password] = args.as_slice() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    };
    if username.trim().is_empty() || password.is_empty() {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    }

    let (api_url, service_key) = match (
        std::env::var("ZARODA_API_URL"),
        std::env::var("SERVICE_ROLE_KEY"),
    ) {
        (Ok(url), Ok(key)) if !url.trim().is_empty() && !key.is_empty() => (url, key),
        _ => {
            eprintln!("Please set ZARODA_API_URL and SERVICE_ROLE_KEY environment variables.");
            return ExitCode::from(1);
        }
    };

    match run(&api_url, &service_key, username.trim(), password).await {
        Ok(admin) => {
            println!("Updated admin: {}", admin);
            ExitCode::SUCCESS
        }
        Err(Failure::Update(message)) => {
            eprintln!("Failed to update admin password: {}", message);
            ExitCode::from(2)
        }
        Err(Failure::Unexpected(e)) => {
            eprintln!("Unexpected error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

async fn run(api_url: &str, service_key: &str, username: &str, password: &str) -> Result<Value, Failure> {
    let hash = bcrypt::hash(password, BCRYPT_COST)
        .context("Failed to hash password")
        .map_err(Failure::Unexpected)?;
    println!("Generated hash: {}", hash);

    let url = format!(
        "{}/api/admin/maintenance/password",
        api_url.trim_end_matches('/')
    );
    let response = reqwest::Client::new()
        .put(&url)
        .header("x-service-key", service_key)
        .json(&json!({ "username": username, "password_hash": hash }))
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))
        .map_err(Failure::Unexpected)?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body["error"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());
        return Err(Failure::Update(format!("{} ({})", message, status)));
    }

    Ok(body)
}

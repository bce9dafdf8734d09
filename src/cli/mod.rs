pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "ministry")]
#[command(about = "Ministry CLI - administration tasks for the Ministry API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create an ADMIN account directly in the database")]
    CreateAdmin {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Initial password")]
        password: String,
    },

    #[command(about = "Print a bcrypt hash of a password")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: String,
    },

    #[command(about = "Check a running server's /health endpoint")]
    Ping {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::db::migrate(output_format).await,
        Commands::CreateAdmin { name, email, password } => {
            commands::admin::create_admin(name, email, password, output_format).await
        }
        Commands::HashPassword { password } => commands::admin::hash_password(password, output_format).await,
        Commands::Ping { url } => commands::server::ping(&url, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_admin() {
        let cli = Cli::parse_from([
            "ministry",
            "create-admin",
            "--name",
            "Pastor",
            "--email",
            "pastor@example.org",
            "--password",
            "secret123",
        ]);
        match cli.command {
            Commands::CreateAdmin { name, email, .. } => {
                assert_eq!(name, "Pastor");
                assert_eq!(email, "pastor@example.org");
            }
            _ => panic!("expected create-admin"),
        }
    }

    #[test]
    fn ping_has_default_url() {
        let cli = Cli::parse_from(["ministry", "--json", "ping"]);
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Ping { url } => assert_eq!(url, "http://localhost:3000"),
            _ => panic!("expected ping"),
        }
    }
}

//! cellar-auth - Sign in to the wine catalogue and manage the stored session

use std::io::{self, BufRead, IsTerminal};

use clap::{Parser, Subcommand};
use libcellar::api::{LoginRequest, RegisterRequest};
use libcellar::service::CellarService;
use libcellar::{CellarError, Result, User};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "cellar-auth")]
#[command(version, about = "Sign in to the wine catalogue and manage the stored session")]
#[command(long_about = r#"Sign in to the wine catalogue and manage the stored session.

The session (user and tokens) is saved to auth-storage.json in the data
directory and shared by cellar-review and cellar-wine.

EXAMPLES:
    # Sign in interactively
    cellar-auth login --email somm@example.com

    # Sign in from a script
    echo "$PASSWORD" | cellar-auth login --email somm@example.com --password-stdin

    # Who am I?
    cellar-auth status --format json

EXIT CODES:
    0 - Success
    1 - Error (network, config, session file)
    2 - Authentication failed
    3 - Invalid input
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        nickname: String,

        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Forget the stored user and tokens
    Logout,

    /// Show who is signed in
    Status,

    /// Exchange the refresh token for a new access token
    Refresh,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libcellar::logging::init_from_env(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let service = CellarService::new()?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Login {
            email,
            password_stdin,
        } => {
            let password = read_password("Password: ", password_stdin)?;
            let request = LoginRequest { email, password };
            let user = service.session().login(service.backend(), &request).await?;
            print_user("Signed in as", &user, json);
        }
        Commands::Register {
            email,
            nickname,
            password_stdin,
        } => {
            let password = read_password("Password: ", password_stdin)?;
            let password_confirmation = if password_stdin {
                SecretString::from(password.expose_secret().to_string())
            } else {
                read_password("Confirm password: ", false)?
            };
            if password.expose_secret() != password_confirmation.expose_secret() {
                return Err(CellarError::InvalidInput(
                    "Passwords do not match".to_string(),
                ));
            }

            let request = RegisterRequest {
                email,
                nickname,
                password,
                password_confirmation,
            };
            let user = service
                .session()
                .register(service.backend(), &request)
                .await?;
            print_user("Registered and signed in as", &user, json);
        }
        Commands::Logout => {
            service.session().logout()?;
            if json {
                println!("{}", json!({ "authenticated": false }));
            } else {
                println!("Signed out");
            }
        }
        Commands::Status => {
            let state = service.session().state();
            if json {
                let status = json!({
                    "authenticated": state.is_authenticated(),
                    "user": state.user,
                    "session_file": service.session().path().display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                match (&state.user, state.is_authenticated()) {
                    (Some(user), true) => println!("Signed in as {} <{}>", user.nickname, user.email),
                    (None, true) => println!("Signed in (no user profile stored)"),
                    (_, false) => println!("Not signed in"),
                }
                println!("Session file: {}", service.session().path().display());
            }
        }
        Commands::Refresh => {
            service.session().refresh(service.backend()).await?;
            if json {
                println!("{}", json!({ "refreshed": true }));
            } else {
                println!("Access token refreshed");
            }
        }
    }

    Ok(())
}

/// Read a password from stdin or an interactive prompt
fn read_password(prompt: &str, from_stdin: bool) -> Result<SecretString> {
    let password = if from_stdin {
        debug!("Reading password from stdin");
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else if io::stdin().is_terminal() {
        rpassword::prompt_password(prompt)?
    } else {
        return Err(CellarError::InvalidInput(
            "Not a TTY. Use --password-stdin to pass the password on stdin.".to_string(),
        ));
    };

    if password.is_empty() {
        return Err(CellarError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    Ok(SecretString::from(password))
}

fn print_user(label: &str, user: &User, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "authenticated": true,
                "user": user,
            })
        );
    } else {
        println!("{} {} <{}>", label, user.nickname, user.email);
    }
}

// accounts_app/src/main.rs

mod config;
mod errors;
mod pg_store;
mod signup;
mod state;

use crate::config::{AppConfig, LogFormat};
use crate::errors::{AppError, Result as AppResult};
use crate::signup::SignupForm;
use crate::state::AppState;

use clap::{Parser, Subcommand};
use std::io::BufRead;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "accounts-admin")]
#[command(about = "User account administration", long_about = None)]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Apply pending database migrations
  Migrate,

  /// Create a user. The password and its confirmation are read from stdin, one per line.
  Signup {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,
  },

  /// Check a password (read from stdin) against the user with this exact email
  Authenticate {
    #[arg(long)]
    email: String,
  },

  /// Print the number of users
  Count,

  /// Print the avatar URL and image tag for a user
  Avatar {
    #[arg(long)]
    email: String,

    /// Requested image size in pixels
    #[arg(long, value_name = "PIXELS")]
    size: Option<u32>,
  },
}

fn init_tracing(format: LogFormat) {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .with_writer(std::io::stderr);

  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn read_stdin_line(stdin: &mut impl BufRead) -> AppResult<String> {
  let mut line = String::new();
  stdin.read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run(cli: Cli, state: AppState) -> AppResult<()> {
  match cli.command {
    Commands::Migrate => {
      sqlx::migrate!("./migrations").run(&state.db_pool).await?;
      tracing::info!("Migrations applied.");
      println!("migrations applied");
    }
    Commands::Signup { name, email } => {
      let mut stdin = std::io::stdin().lock();
      let password = read_stdin_line(&mut stdin)?;
      let password_confirmation = read_stdin_line(&mut stdin)?;
      let form = SignupForm {
        name,
        email,
        password,
        password_confirmation,
      };
      let user = signup::sign_up(&state.users, form).await?;
      println!("{}", user.id);
    }
    Commands::Authenticate { email } => {
      let password = read_stdin_line(&mut std::io::stdin().lock())?;
      match state.users.authenticate(&email, &password).await? {
        Some(user) => println!("{}", user.id),
        None => return Err(AppError::Auth("invalid email or password".to_string())),
      }
    }
    Commands::Count => {
      println!("{}", state.users.count().await?);
    }
    Commands::Avatar { email, size } => {
      let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no user with email '{}'", email)))?;
      let avatars = match size {
        Some(px) => state.avatars.clone().with_size(px),
        None => state.avatars.clone(),
      };
      println!("{}", avatars.url_for(&user));
      println!("{}", avatars.image_tag(&user));
    }
  }
  Ok(())
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(e.exit_code());
    }
  };
  init_tracing(app_config.log_format);
  tracing::debug!(config = ?app_config, "Configuration loaded.");

  let result = match AppState::connect(app_config).await {
    Ok(state) => run(cli, state).await,
    Err(e) => Err(e),
  };

  if let Err(e) = result {
    tracing::error!(error = %e, "Command failed.");
    eprintln!("{}", e);
    std::process::exit(e.exit_code());
  }
}

//! Profile Autofill
//!
//! Command-line front end for the profile filler.
//!
//! ## Usage
//! 1. `profile-autofill login <user>` to remember who is signed in
//! 2. `profile-autofill set-profile --email you@example.com --data-file bio.txt`
//! 3. `profile-autofill fill page.json > filled.json` to fill a form snapshot;
//!    the outcome message goes to stderr, the filled snapshot to stdout
//!
//! Exit status is 1 on failure and 2 when the user must sign in or save a
//! profile first.
//!
//! ## How it works
//! - The signed-in user is kept in the OS keyring
//! - Profiles live in a JSON file (see `store_path` in the config)
//! - A snapshot is loaded into an in-memory document, filled, and written
//!   back out with the new values

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use profile_autofill::config::{load_config, save_config, AppConfig};
use profile_autofill::credentials_store::KeyringAuth;
use profile_autofill::dom::memory::{FormSnapshot, MemoryDocument};
use profile_autofill::error::{AutofillError, Result};
use profile_autofill::profile::Profile;
use profile_autofill::service::{AuthClient, AutofillService, ProfileStore, UserId};
use profile_autofill::store::JsonProfileStore;

#[derive(Debug, Parser)]
#[command(name = "profile-autofill", version, about = "Fill web forms from your profile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Remember the signed-in user
    Login { user: String },
    /// Forget the signed-in user
    Logout,
    /// Save the profile of the signed-in user
    SetProfile {
        #[arg(long, default_value = "")]
        email: String,
        /// File holding the free-text profile
        #[arg(long)]
        data_file: Option<PathBuf>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Delete the profile of the signed-in user
    DeleteProfile,
    /// Update and save the configuration
    Config {
        /// Profile store location
        #[arg(long)]
        store_path: Option<PathBuf>,
        /// trace, debug, info, warn or error
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Fill a form snapshot
    Fill {
        snapshot: PathBuf,
        /// Where to write the filled snapshot (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load environment variables from .env file (optional)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    if let Err(e) = run(cli.command, config) {
        if e.is_recoverable() {
            warn!("{}", e);
            std::process::exit(2);
        }
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, mut config: AppConfig) -> Result<()> {
    let auth = KeyringAuth::new();
    let store = JsonProfileStore::new(config.resolved_store_path()?);

    match command {
        Command::Login { user } => auth.sign_in(&UserId::new(user)),
        Command::Logout => {
            auth.sign_out()?;
            info!("Signed out");
            Ok(())
        }
        Command::SetProfile {
            email,
            data_file,
            api_key,
        } => {
            let user = auth.current_user()?.ok_or(AutofillError::NotSignedIn)?;
            let raw_profile_data = match data_file {
                Some(path) => fs::read_to_string(path)?,
                None => String::new(),
            };

            let mut profile = Profile::new(email, raw_profile_data);
            if let Some(key) = api_key {
                profile = profile.with_api_key(key);
            }

            store.save_profile(&user, &profile)?;
            info!("Profile saved for {}", user);
            Ok(())
        }
        Command::DeleteProfile => {
            let user = auth.current_user()?.ok_or(AutofillError::NotSignedIn)?;
            store.delete_profile(&user)?;
            info!("Profile deleted for {}", user);
            Ok(())
        }
        Command::Config {
            store_path,
            log_level,
        } => {
            config.update(store_path, log_level);
            save_config(&config)?;
            info!("Configuration saved");
            Ok(())
        }
        Command::Fill { snapshot, output } => {
            let content = fs::read_to_string(&snapshot)?;
            let snapshot: FormSnapshot = serde_json::from_str(&content)
                .map_err(|e| AutofillError::Document(e.to_string()))?;
            let document = MemoryDocument::from_snapshot(&snapshot);

            // Failures abort before any output is written
            let service = AutofillService::new(auth, store);
            let notification = service.try_run(&document)?;
            eprintln!("{}", notification.message());

            let filled = serde_json::to_string_pretty(&document.to_snapshot())
                .map_err(|e| AutofillError::Document(e.to_string()))?;
            match output {
                Some(path) => fs::write(path, filled)?,
                None => println!("{}", filled),
            }
            Ok(())
        }
    }
}

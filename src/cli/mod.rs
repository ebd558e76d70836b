//! cli
//!
//! Command-line interface for headwatch.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialise logging and load configuration
//! - Build the provider registry and dispatch to it
//!
//! The CLI layer is thin: every lookup goes through
//! [`ProviderRegistry::resolve`], exactly as a library caller would.

pub mod args;

pub use args::{Cli, Command, Shell};

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, shells};
use log::LevelFilter;

use crate::config::Config;
use crate::forge::{Auth, ProviderRegistry};
use crate::http::CancelSignal;

/// Exit status when no API lookup applies and a full clone is needed.
pub const EXIT_FALLBACK: u8 = 2;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    match cli.command {
        Command::Completion { shell } => {
            completion(shell);
            Ok(ExitCode::SUCCESS)
        }
        Command::Providers => {
            let registry = load_registry(&cli)?;
            print!("{}", describe_providers(&registry));
            Ok(ExitCode::SUCCESS)
        }
        Command::Which { ref url } => {
            let registry = load_registry(&cli)?;
            match registry.select(url) {
                Some(provider) => println!("{}", provider.name()),
                None => println!("none"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve {
            ref url,
            ref reference,
            ref token,
            ref user,
            ref password,
            timeout,
        } => {
            let registry = load_registry(&cli)?;
            let auth = build_auth(token.as_deref(), user.as_deref(), password.as_deref())?;
            let cancel = match timeout {
                Some(secs) => CancelSignal::with_timeout(Duration::from_secs(secs)),
                None => CancelSignal::new(),
            };

            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            let result = runtime.block_on(registry.resolve(&cancel, url, reference, &auth));

            match result {
                Ok(hash) => {
                    println!("{}", hash);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_generic() => {
                    eprintln!("error: {}", e);
                    eprintln!("hint: no API lookup is available for this repository; clone it and resolve the ref locally");
                    Ok(ExitCode::from(EXIT_FALLBACK))
                }
                Err(e) => {
                    let mut message = e.to_string();
                    if let Some(cause) = e.cause() {
                        message.push_str(&format!(": {}", cause));
                    }
                    bail!(message)
                }
            }
        }
    }
}

/// Initialise `env_logger`. `--debug` forces the `debug` level; otherwise
/// `RUST_LOG` applies with `warn` as the default.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    // A logger may already be installed when running under a test harness.
    let _ = builder.format_timestamp(None).try_init();
}

/// Load configuration and build the registry with a default HTTP client.
fn load_registry(cli: &Cli) -> Result<ProviderRegistry> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;
    Ok(ProviderRegistry::from_config(&config, Arc::new(client)))
}

/// Build auth from flags, prompting for a missing Basic password.
fn build_auth(token: Option<&str>, user: Option<&str>, password: Option<&str>) -> Result<Auth> {
    if let Some(token) = token {
        return Ok(Auth::token(token));
    }

    let Some(user) = user else {
        return Ok(Auth::None);
    };

    let password = match password {
        Some(p) => p.to_string(),
        // Prompt on the terminal so stdout carries only the hash.
        None => rpassword::prompt_password(format!("Password for '{}': ", user))
            .context("Failed to read password")?,
    };

    Ok(Auth::basic(user, password))
}

/// One line per provider: name, tab, hosts (`*` for a wildcard).
fn describe_providers(registry: &ProviderRegistry) -> String {
    let mut out = String::new();
    for provider in registry.providers() {
        let hosts = if provider.is_wildcard() {
            "*".to_string()
        } else {
            provider.hosts().to_string()
        };
        out.push_str(&format!("{}\t{}\n", provider.name(), hosts));
    }
    out
}

/// Generate shell completion scripts.
fn completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, &name, &mut io::stdout()),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, &name, &mut io::stdout()),
        Shell::Fish => generate(shells::Fish, &mut cmd, &name, &mut io::stdout()),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, &name, &mut io::stdout()),
    }
}

use std::process::ExitCode;

use clap::Parser;
use rest_core::RestClient;
use tracing_subscriber::EnvFilter;
use xivapi_demo::{lookup_character, override_config, DEFAULT_NAME, DEFAULT_SERVER};

/// Print a character's active class, level and avatar from XIVAPI.
#[derive(Parser)]
#[command(name = "xivapi-demo")]
struct Cli {
    /// Character name, as shown in game
    #[arg(default_value = DEFAULT_NAME)]
    name: String,

    /// Home world of the character
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Override the API base URL (e.g. a local mock server)
    #[arg(long)]
    base_url: Option<String>,

    /// Send this key as a Bearer token
    #[arg(long)]
    token: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut client = match cli.base_url {
        Some(base_url) => RestClient::new(override_config(base_url, cli.token.as_deref())),
        None => match RestClient::create("ff14", cli.token.as_deref()) {
            Some(client) => client,
            None => {
                eprintln!("error: no client preset for ff14");
                return ExitCode::FAILURE;
            }
        },
    };

    match lookup_character(&mut client, &cli.name, &cli.server) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

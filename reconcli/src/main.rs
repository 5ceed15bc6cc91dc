mod config;
mod render;
mod ui;

use clap::{ArgAction, Parser};
use config::{config_path, get_default_config_toml, load_config, Overrides};
use console::{style, Term};
use futures::StreamExt;
use libcensys_recon::{
    ChainedCredentials, CredentialProvider, EnvCredentials, FetchResult, Recon, API_ID_ENV,
    API_SECRET_ENV,
};
use render::{render_result, BANNER};
use std::{
    io::{self, Write},
    path::PathBuf,
    pin::pin,
};
use tracing_subscriber::EnvFilter;
use ui::Spinner;

#[derive(Parser, Debug)]
#[command(name = "censys-recon", version)]
#[command(about = "Censys exposure analyzer - open ports, services and vulnerabilities for IPs and domains", long_about = None)]
struct Args {
    /// One or more IP addresses, domains or URLs
    #[arg(
        value_name = "INPUT",
        required_unless_present_any = ["print_default_config", "write_default_config"]
    )]
    inputs: Vec<String>,

    /// Maximum simultaneous Censys lookups [default: 5]
    #[arg(long, short = 'c')]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds [default: 10]
    #[arg(long, short = 't')]
    timeout: Option<u64>,

    /// Pace requests to at most this many per second per endpoint
    #[arg(long)]
    rate: Option<u32>,

    /// Output results as NDJSON stream (one JSON object per line)
    #[arg(long, short = 'j')]
    ndjson: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Print the default config to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Write the default config to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn fatal(message: &str) -> ! {
    eprintln!("{}", style(format!("[!] {}", message)).red());
    std::process::exit(1);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.print_default_config {
        println!("{}", get_default_config_toml());
        return Ok(());
    }

    if args.write_default_config {
        let Some(path) = args.config.clone().or_else(config_path) else {
            fatal("Could not determine config path");
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, get_default_config_toml())?;
        println!("Default config written to: {}", path.display());
        return Ok(());
    }

    let config = load_config(args.config.as_deref()).unwrap_or_else(|e| fatal(&e.to_string()));

    let credentials = ChainedCredentials::new()
        .with(EnvCredentials::default())
        .with(config.censys.clone())
        .credentials()
        .unwrap_or_else(|e| {
            fatal(&format!(
                "{}. Set {} and {} or add them to the [censys] section of the config file.",
                e, API_ID_ENV, API_SECRET_ENV
            ))
        });

    let recon_config = config.recon_config(&Overrides {
        max_concurrent: args.concurrency,
        timeout_secs: args.timeout,
        max_rate_per_second: args.rate,
    });
    tracing::debug!(?recon_config, "starting recon");

    let recon = Recon::with_config(credentials, recon_config).unwrap_or_else(|e| fatal(&e.to_string()));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tokio::select! {
            res = run(&recon, args.inputs, args.ndjson) => res,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", style("\n[!] Process interrupted by user.").red());
                std::process::exit(1);
            }
        }
    })
}

async fn run(recon: &Recon, inputs: Vec<String>, ndjson: bool) -> Result<(), Box<dyn std::error::Error>> {
    if ndjson {
        return run_ndjson(recon, inputs).await;
    }

    println!("{}", style(BANNER).green());

    let lookups = recon.plan(&inputs).await;
    let spinner = Spinner::start(
        "Performing Censys recon...".to_string(),
        lookups.len(),
        Term::stderr().is_term(),
    );

    let mut results: Vec<FetchResult> = Vec::with_capacity(lookups.len());
    let mut stream = recon.run_stream(lookups);
    while let Some(result) = stream.next().await {
        spinner.print(&render_result(&result));
        results.push(result);
    }
    spinner.stop().await;

    let found = results.iter().filter(|r| r.outcome.is_found()).count();
    println!(
        "{}",
        style(format!(
            "[*] Censys recon completed: {} of {} lookups returned host data.",
            found,
            results.len()
        ))
        .cyan()
    );

    Ok(())
}

async fn run_ndjson(recon: &Recon, inputs: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = pin!(recon.recon_stream(inputs));

    while let Some(result) = stream.next().await {
        let json = serde_json::to_string(&result)?;
        println!("{}", json);
        io::stdout().flush()?;
    }

    Ok(())
}

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use certpin_client::TrustConfig;
use certpin_client::TrustedHttpClient;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Fetched when no URL is given on the command line.
pub const DEFAULT_TARGET_URL: &str = "https://repo.maven.apache.org/maven2/org/apache/maven/plugins/maven-clean-plugin/2.5/maven-clean-plugin-2.5.pom";

/// Fetch a URL over HTTPS, trusting only the certificates in a PEM bundle.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// Certificate bundle: a filesystem path or a packaged resource name.
    /// Overrides `CERTPIN_CA_BUNDLE` and the config file.
    #[arg(long, value_name = "ID")]
    pub bundle: Option<String>,

    /// Extra directory to search for packaged resources. May be repeated.
    #[arg(long = "resource-dir", value_name = "DIR")]
    pub resource_dirs: Vec<PathBuf>,

    /// TOML file providing `bundle` and `resource_dirs`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log certificate loading and requests to stderr.
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// URL to fetch.
    #[arg(value_name = "URL", default_value = DEFAULT_TARGET_URL)]
    pub url: String,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn trust_config(&self) -> anyhow::Result<TrustConfig> {
        let base = match &self.config {
            Some(path) => TrustConfig::load(path)
                .with_context(|| format!("could not load {}", path.display()))?,
            None => TrustConfig::default(),
        };
        let mut config = base.apply_env();
        if let Some(bundle) = &self.bundle {
            config.bundle = bundle.clone();
        }
        config.resource_dirs.extend(self.resource_dirs.iter().cloned());
        Ok(config)
    }
}

pub fn run_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let default_level = if cli.verbose { "info" } else { "error" };
    let _ = tracing_subscriber::fmt()
        // Fall back to `default_level` if RUST_LOG is unset or invalid.
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let config = cli.trust_config()?;
    tracing::info!("Fetching {} with bundle `{}`", cli.url, config.bundle);

    match fetch(&config, &cli.url) {
        Ok(body) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Error fetching content: {err:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn fetch(config: &TrustConfig, url: &str) -> anyhow::Result<String> {
    let client = TrustedHttpClient::from_config(config)?;
    Ok(client.fetch(url)?)
}

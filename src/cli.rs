use crate::config::Config;
use crate::display::print_warning;
use crate::errors::Result;
use crate::interactive::{self, Session, TerminalFrontend};
use crate::output;
use clap::{Parser, ValueEnum};
use flavor_api::{load_collection, OpenStackClient};
use flavor_core::{FlavorFilter, SortKey};
use log::{debug, info};
use std::io;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  os-flavor-selector --vcpus-min 4 --memory-min 8
  os-flavor-selector --output json --name gpu --sort memory --reverse
  os-flavor-selector --output text --vcpus-max 2

Credentials are read from OS_* environment variables (OS_AUTH_URL, OS_USERNAME,
OS_PASSWORD, OS_PROJECT_NAME, ...) or from ~/.os-flavor-selector/config.toml.";

/// How results are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Browse, filter and sort in a terminal table
    Interactive,
    /// One `key=value` line per flavor
    Text,
    /// One JSON object per flavor per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "os-flavor-selector")]
#[command(about = "Filter and sort OpenStack flavors based on resource criteria")]
#[command(version)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Output mode
    #[arg(long, value_enum, default_value_t = OutputMode::Interactive)]
    pub output: OutputMode,

    /// Minimum memory in GiB (0 means no minimum)
    #[arg(long, value_name = "GIB")]
    pub memory_min: Option<u64>,

    /// Maximum memory in GiB (0 means no maximum)
    #[arg(long, value_name = "GIB")]
    pub memory_max: Option<u64>,

    /// Minimum number of VCPUs (0 means no minimum)
    #[arg(long, value_name = "COUNT")]
    pub vcpus_min: Option<u32>,

    /// Maximum number of VCPUs (0 means no maximum)
    #[arg(long, value_name = "COUNT")]
    pub vcpus_max: Option<u32>,

    /// Only show flavors whose name contains this text
    #[arg(long)]
    pub name: Option<String>,

    /// Sort by this flavor attribute (interactive mode: name, vcpus or memory)
    #[arg(long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Sort in descending order
    #[arg(long)]
    pub reverse: bool,

    /// Start interactive mode with all details shown
    #[arg(short, long)]
    pub long: bool,

    /// Path to the configuration file
    #[arg(long, env = "OS_FLAVOR_SELECTOR_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Filter built from the command line; a zero bound leaves it unset
    pub fn filter(&self) -> Result<FlavorFilter> {
        let mut filter = FlavorFilter::default();
        if let Some(name) = &self.name {
            filter.set_name(name);
        }
        filter.set_vcpu_range(self.vcpus_min.unwrap_or(0), self.vcpus_max.unwrap_or(0));
        filter.set_memory_range(self.memory_min.unwrap_or(0), self.memory_max.unwrap_or(0));
        filter.validate()?;
        Ok(filter)
    }

    pub fn sort_key(&self) -> Result<Option<SortKey>> {
        Ok(self.sort.as_deref().map(str::parse::<SortKey>).transpose()?)
    }

    /// Initial interactive session from `--sort`, `--reverse` and `--long`
    pub fn session(&self) -> Result<Session> {
        let sort_by = self.sort_key()?.unwrap_or(SortKey::Name);
        Session::new(sort_by, self.reverse, self.long)
    }
}

/// Validate arguments, retrieve flavors and present them
pub async fn run_cli(cli: Cli) -> Result<()> {
    // Everything the user typed is checked before any network call
    let filter = cli.filter()?;
    let sort_key = cli.sort_key()?;
    let session = match cli.output {
        OutputMode::Interactive => Some(cli.session()?),
        _ => None,
    };

    let config = Config::load(cli.config.as_deref())?;
    let client = OpenStackClient::from_config(&config)?;

    let mut flavors = load_collection(&client, filter).await?;
    info!("Loaded {} flavors", flavors.len());

    if flavors.list().is_empty() {
        print_warning("No flavors match the given criteria");
    }

    match session {
        Some(session) => {
            let mut frontend = TerminalFrontend::new(cli.debug);
            let session = interactive::run(&mut flavors, session, &mut frontend)?;
            debug!("Interactive session ended: {:?}", session);
        }
        None => {
            let selected = output::select(&flavors, sort_key, cli.reverse);
            let mut stdout = io::stdout().lock();
            match cli.output {
                OutputMode::Json => output::write_json(&mut stdout, &selected)?,
                _ => output::write_text(&mut stdout, &selected)?,
            }
        }
    }

    Ok(())
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "fieldwatch-gateway")]
#[command(version = "0.1.0")]
#[command(about = "Dashboard backend that forwards field queries to the monitoring API", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yml")]
    pub config: PathBuf,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Upstream base URL, overrides `upstream.base_url` from the config file
    #[arg(long, value_name = "URL")]
    pub upstream: Option<String>,

    /// Validate config and exit
    #[arg(long)]
    pub validate_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

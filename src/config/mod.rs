pub mod toml_config;

use clap::Parser;

pub use toml_config::AppConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "shipdash")]
#[command(about = "Dashboard backend that forwards shipment tagging to ShipStation")]
pub struct CliConfig {
    #[arg(long, default_value = "shipdash.toml")]
    pub config: String,

    #[arg(long, help = "Override the configured listen port")]
    pub port: Option<u16>,

    #[arg(long, help = "Log one JSON object per line")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

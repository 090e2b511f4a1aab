use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dircast",
    about = "DLNA/UPnP media server — share a directory with the TVs on your network",
    long_about = None,
    version,
)]
pub struct Args {
    /// Directory to expose as the browse root
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// HTTP port to listen on [default: 1338]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Friendly server name shown on DLNA client device lists
    #[arg(short, long)]
    pub name: Option<String>,

    /// Path to TOML config file (overrides default search: ./dircast.toml,
    /// ~/.config/dircast/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

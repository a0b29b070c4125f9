use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(
    name = "photogate",
    about = "Photogate - gateway between the photo UI and its compute backend",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "PHOTOGATE_CONFIG", help = "JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "PHOTOGATE_PORT", help = "Override the listen port")]
    pub port: Option<u16>,

    #[arg(long, global = true, env = "PHOTOGATE_BACKEND_URL", help = "Override the local backend URL")]
    pub backend_url: Option<Url>,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the gateway (default if no command specified)")]
    Serve {
        #[arg(short, long, env = "PHOTOGATE_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Check backend readiness; exit code 0 when ready")]
    Probe {
        #[arg(long, default_value = "0", help = "Keep probing for up to SECS seconds")]
        wait: u64,

        #[arg(long, default_value = "1000", help = "Delay between probes in milliseconds")]
        interval: u64,
    },

    #[command(about = "Print the mode the gateway would run in right now")]
    Mode {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List the capabilities exposed through the gateway")]
    Capabilities {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}

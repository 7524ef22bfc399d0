use clap::Parser;
use roulette_config::RouletteConfig;

/// Roulette: anonymous one-to-one video chat with strangers.
#[derive(Parser, Debug)]
#[command(name = "roulette", version, about)]
pub struct Args {
    /// Name to register under. Prompted for when omitted.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override, as a tracing filter directive.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Matching service HTTP base URL.
    #[arg(long)]
    pub matching_url: Option<String>,

    /// Matching service WebSocket base URL.
    #[arg(long)]
    pub matching_ws_url: Option<String>,

    /// Signaling relay WebSocket base URL.
    #[arg(long)]
    pub signaling_url: Option<String>,
}

impl Args {
    /// Apply command-line endpoint overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut RouletteConfig) {
        if let Some(url) = &self.matching_url {
            config.matching.http_url = url.clone();
        }
        if let Some(url) = &self.matching_ws_url {
            config.matching.ws_url = url.clone();
        }
        if let Some(url) = &self.signaling_url {
            config.signaling.ws_url = url.clone();
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

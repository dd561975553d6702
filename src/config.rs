//! Service configuration
//!
//! One immutable `Config` is resolved at startup from command-line
//! arguments with environment-variable fallbacks and shared through
//! `AppState`. The AI collaborator base URL has no default: starting
//! without it is a configuration error, not a runtime one.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "pulsecheck", version, about = "Anonymous wellbeing check-in service")]
pub struct Config {
    /// Address to serve the HTTP API on
    #[arg(long, env = "PULSECHECK_BIND", default_value = "127.0.0.1:5740")]
    pub bind: String,

    /// Path to the SQLite database file
    #[arg(long, env = "PULSECHECK_DB", default_value = "pulsecheck.db")]
    pub database: PathBuf,

    /// Base URL of the AI summarization collaborator (required)
    #[arg(long, env = "PULSECHECK_AI_SUMMARY_URL")]
    pub ai_summary_url: String,

    /// Timeout for AI collaborator requests, in seconds
    #[arg(long, env = "PULSECHECK_AI_TIMEOUT_SECS", default_value_t = 5)]
    pub ai_timeout_secs: u64,

    /// Salt for one-way hashing of client network addresses
    #[arg(
        long,
        env = "PULSECHECK_IP_HASH_SALT",
        default_value = "change-me-in-production"
    )]
    pub ip_hash_salt: String,

    /// Theme string that force-escalates an identity's latest submission
    #[arg(
        long,
        env = "PULSECHECK_CRISIS_THEME",
        default_value = "Onveiligheidsgevoel"
    )]
    pub crisis_theme: String,

    /// Escalation sweep interval, in seconds
    #[arg(long, env = "PULSECHECK_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Concurrent AI lookups during theme aggregation
    #[arg(long, env = "PULSECHECK_THEME_FANOUT", default_value_t = 8)]
    pub theme_fanout: usize,
}

impl Config {
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

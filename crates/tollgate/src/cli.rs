//! Command-line interface for operating tollgate.
//!
//! The CLI inspects the resolved configuration and exercises the quota
//! limiter without a web server in front of it:
//!
//! - `policies`: print the quota preset table
//! - `probe`: run the counter backend capability probe
//! - `simulate`: drive a limiter and print each decision with its headers

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tollgate_core::Plan;
use tollgate_rate_limit::OperationClass;

/// Tollgate operator CLI.
#[derive(Debug, Parser)]
#[command(name = "tollgate", version, about = "Admission control for metered operations")]
pub struct Cli {
    /// Configuration file to use instead of the layered defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry
    #[arg(long, global = true)]
    pub otel: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the resolved quota presets
    Policies {
        /// Only show limits for this plan (free, pro, creator)
        #[arg(short, long)]
        plan: Option<Plan>,
    },

    /// Probe the shared counter backend and report the coordination mode
    Probe {
        /// Backend URL; defaults to TOLLGATE_REDIS_URL or REDIS_URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Send a burst of requests through a limiter and print each decision
    Simulate {
        /// Subject the quota is scoped to (user id or IP)
        #[arg(short, long, default_value = "demo-user")]
        subject: String,

        /// Operation class (ai-generation, scraping, image-generation, generic-read)
        #[arg(long, default_value = "ai-generation")]
        class: OperationClass,

        /// Plan selecting the preset
        #[arg(short, long, default_value = "free")]
        plan: Plan,

        /// Number of requests to send
        #[arg(short = 'n', long, default_value_t = 12)]
        requests: u32,

        /// Use the shared counter backend when one is configured
        #[arg(long)]
        distributed: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_parses_enums() {
        let cli = Cli::parse_from([
            "tollgate",
            "simulate",
            "--class",
            "image-generation",
            "--plan",
            "Pro",
            "-n",
            "3",
        ]);
        match cli.command {
            Commands::Simulate {
                class,
                plan,
                requests,
                distributed,
                ..
            } => {
                assert_eq!(class, OperationClass::ImageGeneration);
                assert_eq!(plan, Plan::Pro);
                assert_eq!(requests, 3);
                assert!(!distributed);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["tollgate", "policies", "--otel", "-c", "custom.toml"]);
        assert!(cli.otel);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}

//! Config validation CLI tool
//!
//! Validates a callclock timer policy file and reports any errors.

use callclock_api::EntitlementTier;
use callclock_util::{default_config_path, format_countdown};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a callclock timer policy file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match callclock_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", callclock_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Standard session: {}",
                format_countdown(policy.max_seconds(EntitlementTier::Standard))
            );
            println!(
                "  Extended session: {}",
                format_countdown(policy.max_seconds(EntitlementTier::Extended))
            );
            match policy.mid_session_threshold() {
                Some(threshold) => {
                    println!("  Decision point: {} remaining", format_countdown(threshold))
                }
                None => println!("  Decision point: disabled"),
            }
            println!(
                "  Upgrade prompt: under {} remaining",
                format_countdown(policy.upsell.threshold_seconds)
            );
            println!("  Tick period: {:?}", policy.runtime.tick_interval);
            if policy.rewards.enabled {
                println!("  Reward networks: {}", policy.rewards.networks.join(", "));
            } else {
                println!("  Reward networks: disabled");
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                callclock_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                callclock_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                callclock_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                callclock_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        callclock_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}

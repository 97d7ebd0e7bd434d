//! Bucketscope CLI Binary
//!
//! Command-line interface for browsing and editing nested-bucket stores.
//! Results go to stdout; logs and error envelopes go to stderr.

use bucketscope::cli::{exit_code, map_error, Cli, OutputFormat, RunContext};
use bucketscope::config::ConfigLoader;
use bucketscope::error::ApiError;
use bucketscope::logging::{init_logging, LoggingConfig};
use clap::Parser;
use std::io::IsTerminal;
use std::process;
use tracing::{debug, error};

fn main() {
    let cli = Cli::parse();

    // Logging comes up before config errors are reported, so a broken config
    // file still yields a log line with the default settings.
    let loaded = ConfigLoader::load_with(cli.config.as_deref());
    let base_logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let logging_config = build_logging_config(&cli, base_logging);

    if let Err(e) = init_logging(Some(&logging_config)) {
        fail(&e);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            fail(&e);
        }
    };
    debug!(?config, "configuration loaded");

    let color = cli.format == OutputFormat::Text
        && logging_config.color
        && std::io::stdout().is_terminal();
    let context = RunContext::new(cli.db.clone(), config, cli.format).with_color(color);

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => fail(&e),
    }
}

fn fail(e: &ApiError) -> ! {
    eprintln!("{}", map_error(e));
    process::exit(exit_code(e));
}

/// Build logging configuration from the config file, environment and CLI
/// flags. Precedence: CLI flags override environment override config file.
fn build_logging_config(cli: &Cli, base: LoggingConfig) -> LoggingConfig {
    let mut config = base.with_env_overrides();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
        // Keep verbose output visible when logs normally go only to a file.
        if config.output == "file" {
            config.output = "file+stderr".to_string();
        }
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}

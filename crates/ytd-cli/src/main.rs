mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose))),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Extract { url, options }) => {
            commands::extract::run(&url, &options, config_path).await
        }
        Some(Commands::Split {
            audio,
            description,
            title,
            output,
            encode,
        }) => {
            let args = commands::split::SplitArgs {
                audio,
                description,
                title,
                output,
                encode,
            };
            commands::split::run(&args, config_path).await
        }
        Some(Commands::Timestamps {
            input,
            duration,
            keep_preamble,
        }) => commands::timestamps::run(
            input.as_deref(),
            duration.as_deref(),
            keep_preamble,
            config_path,
        ),
        Some(Commands::Doctor) => commands::doctor::run(config_path).await,
        Some(Commands::Config) => commands::config::run(config_path).await,
        None => {
            // If URL provided directly, treat as extract command
            if let Some(url) = cli.url {
                commands::extract::run(&url, &cli.options, config_path).await
            } else {
                // No URL, print help
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}

/// Default filter for a `-v` count; warnings only, so logs stay out of the progress bars
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "ytd=warn,ytd_core=warn",
        1 => "ytd=info,ytd_core=info",
        2 => "ytd=debug,ytd_core=debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_by_verbosity() {
        assert_eq!(log_filter(0), "ytd=warn,ytd_core=warn");
        assert_eq!(log_filter(1), "ytd=info,ytd_core=info");
        assert_eq!(log_filter(2), "ytd=debug,ytd_core=debug");
        assert_eq!(log_filter(3), "trace");
        assert_eq!(log_filter(7), "trace");
    }
}

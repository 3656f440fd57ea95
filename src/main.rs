use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use informant::app::AppContext;
use informant::cli::{commands, Cli, Commands};
use informant::config::{Config, EnvSnapshot};
use informant::hook;
use informant::store::FallbackMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "informant=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    // Hook management needs neither config nor storage
    match cli.command {
        Commands::Install { force } => return Ok(hook::install(force)?),
        Commands::Uninstall => return Ok(hook::uninstall()?),
        _ => {}
    }

    let env = EnvSnapshot::capture();
    let config_file = Config::discover(cli.config.as_deref(), &env);
    let config = Config::load(config_file.as_deref())?;
    let env = env.with_config_file(config_file);

    let mode = if cli.no_confirm || matches!(cli.command, Commands::Check) {
        FallbackMode::NonInteractive
    } else {
        FallbackMode::Interactive
    };
    let ctx = AppContext::new(config, env, mode)?;

    match cli.command {
        Commands::List { unread, reverse } => {
            commands::list(&ctx, unread, reverse).await?;
        }
        Commands::Read { item, all } => {
            commands::read(&ctx, item.as_deref(), all).await?;
        }
        Commands::Check => {
            let code = commands::check(&ctx).await?;
            std::process::exit(i32::from(code));
        }
        Commands::Tui => {
            informant::tui::run(&ctx).await?;
        }
        Commands::Cleanup { older_than } => {
            commands::cleanup(&ctx, older_than)?;
        }
        Commands::Install { .. } | Commands::Uninstall => {}
    }

    Ok(())
}

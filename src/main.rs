use clap::Parser;
use tracing::error;

use reviewtap::app::AppContext;
use reviewtap::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut ctx = AppContext::new(cli.config.clone())?;
    cli.apply_overrides(&mut ctx.config);
    ctx.ensure_dirs()?;

    // Buffered file lines are flushed when the guard drops
    let _guard = reviewtap::logging::init(&ctx.config.logging, ctx.logs_dir())?;

    let result = match &cli.command {
        Commands::Categories { output } => commands::categories(&ctx, output.as_deref()).await,
        Commands::Products { input, output } => {
            commands::products(&ctx, input.as_deref(), output.as_deref()).await
        }
        Commands::Reviews { input, output } => {
            commands::reviews(&ctx, input.as_deref(), output.as_deref()).await
        }
        Commands::Run => commands::run_pipeline(&ctx).await,
        Commands::Config => commands::show_config(&ctx),
    };

    if let Err(e) = &result {
        error!("Run aborted: {}", e);
    }
    Ok(result?)
}

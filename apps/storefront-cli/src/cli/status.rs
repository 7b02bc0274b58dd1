use clap::Args;

use super::Session;
use crate::error::CliResult;

#[derive(Debug, Args)]
pub(crate) struct StatusArgs {
    /// Print JSON instead of lines
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run(args: StatusArgs, session: &Session) -> CliResult<()> {
    let context = &session.context;
    let status = context.coordinator().status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("mode: {}", status.mode);
    println!("products: {}", status.product_count);
    println!("refreshes: {}", status.refresh_count);
    println!(
        "last_refresh_at: {}",
        status.last_refresh_at.as_deref().unwrap_or("never")
    );
    println!("last_error: {}", status.last_error.as_deref().unwrap_or("none"));
    println!("theme: {}", context.theme());
    println!(
        "user: {}",
        context
            .current_session()
            .await
            .map_or_else(|| "none".to_string(), |user| user.username)
    );

    Ok(())
}

use clap::{Args, Subcommand};

use storefront_core::deeplink::create_deep_link;

use super::Session;
use crate::error::{CliError, CliResult};

#[derive(Debug, Args)]
pub(crate) struct LinkCommand {
    #[command(subcommand)]
    command: LinkSubcommand,
}

#[derive(Debug, Subcommand)]
enum LinkSubcommand {
    /// Route an incoming link; parked for later when logged out
    Open(OpenLinkArgs),
    /// Print the route parked by an earlier `open`, once
    Resume,
    /// Build a shareable link
    Create(CreateLinkArgs),
}

#[derive(Debug, Args)]
struct OpenLinkArgs {
    url: String,
}

#[derive(Debug, Args)]
struct CreateLinkArgs {
    /// Path, e.g. "produk" or "home"
    path: String,

    /// Query parameter as key=value, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

pub(crate) async fn run(command: LinkCommand, session: &Session) -> CliResult<()> {
    let context = &session.context;

    match command.command {
        LinkSubcommand::Open(args) => {
            let route = context.handle_deep_link(&args.url).await;
            println!("{}", route.path());
        }
        LinkSubcommand::Resume => match context.take_pending_route().await {
            Some(route) => println!("{}", route.path()),
            None => println!("no pending link"),
        },
        LinkSubcommand::Create(args) => {
            let params = split_params(&args.params)?;
            println!("{}", create_deep_link(&args.path, &params)?);
        }
    }

    Ok(())
}

fn split_params(raw: &[String]) -> CliResult<Vec<(&str, &str)>> {
    raw.iter()
        .map(|param| {
            param
                .split_once('=')
                .ok_or_else(|| CliError::validation(format!("expected KEY=VALUE, got '{}'", param)))
        })
        .collect()
}

use clap::{Args, Subcommand};

use storefront_core::Theme;

use super::Session;
use crate::error::CliResult;

#[derive(Debug, Args)]
pub(crate) struct ThemeCommand {
    #[command(subcommand)]
    command: ThemeSubcommand,
}

#[derive(Debug, Subcommand)]
enum ThemeSubcommand {
    /// Print the saved theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Save a specific theme
    Set(SetThemeArgs),
}

#[derive(Debug, Args)]
struct SetThemeArgs {
    /// light or dark
    theme: Theme,
}

pub(crate) async fn run(command: ThemeCommand, session: &Session) -> CliResult<()> {
    let context = &session.context;

    let theme = match command.command {
        ThemeSubcommand::Show => context.theme(),
        ThemeSubcommand::Toggle => context.toggle_theme().await?,
        ThemeSubcommand::Set(args) => {
            context.set_theme(args.theme).await?;
            args.theme
        }
    };

    println!("{}", theme);
    Ok(())
}

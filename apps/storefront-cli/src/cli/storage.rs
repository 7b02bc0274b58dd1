use clap::{Args, Subcommand};

use super::Session;
use crate::error::CliResult;

#[derive(Debug, Args)]
pub(crate) struct StorageCommand {
    #[command(subcommand)]
    command: StorageSubcommand,
}

#[derive(Debug, Subcommand)]
enum StorageSubcommand {
    /// Print every stored key and value as JSON
    Dump,
    /// Delete one stored key
    Clear(ClearArgs),
}

#[derive(Debug, Args)]
struct ClearArgs {
    key: String,
}

pub(crate) async fn run(command: StorageCommand, session: &Session) -> CliResult<()> {
    let storage = session.context.storage();

    match command.command {
        StorageSubcommand::Dump => {
            let entries = storage.entries().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        StorageSubcommand::Clear(args) => {
            storage.remove(&args.key).await?;
            println!("cleared {}", args.key);
        }
    }

    Ok(())
}

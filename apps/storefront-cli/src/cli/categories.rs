use clap::{Args, Subcommand};

use super::Session;
use crate::error::CliResult;

#[derive(Debug, Args)]
pub(crate) struct CategoriesCommand {
    #[command(subcommand)]
    command: CategoriesSubcommand,
}

#[derive(Debug, Subcommand)]
enum CategoriesSubcommand {
    /// List categories, sorted by name
    List,
    /// Create a category (online only)
    Add(AddCategoryArgs),
}

#[derive(Debug, Args)]
struct AddCategoryArgs {
    name: String,
}

pub(crate) async fn run(command: CategoriesCommand, session: &Session) -> CliResult<()> {
    let coordinator = session.context.coordinator();

    match command.command {
        CategoriesSubcommand::List => {
            let categories = coordinator.categories().await?;
            if categories.is_empty() {
                println!("no categories");
            }
            for category in categories {
                println!("{:>4}  {}", category.id, category.name);
            }
        }
        CategoriesSubcommand::Add(args) => {
            let category = coordinator.add_category(&args.name).await?;
            println!("{:>4}  {}", category.id, category.name);
        }
    }

    Ok(())
}

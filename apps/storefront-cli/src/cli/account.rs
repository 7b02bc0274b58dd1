use clap::{Args, Subcommand};

use storefront_sync::{Credentials, Registration};

use super::Session;
use crate::error::CliResult;

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Create an account
    Register(RegisterArgs),
    /// Log in and store the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Print the logged-in user
    Whoami,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
}

pub(crate) async fn run(command: AccountCommand, session: &Session) -> CliResult<()> {
    let context = &session.context;

    match command.command {
        AccountSubcommand::Register(args) => {
            let profile = context
                .accounts()?
                .register(&Registration {
                    username: args.username,
                    email: args.email,
                    password: args.password,
                })
                .await?;
            println!("registered {} (id {})", profile.username, profile.id);
        }
        AccountSubcommand::Login(args) => {
            let user = context
                .accounts()?
                .login(&Credentials {
                    username: args.username,
                    password: args.password,
                })
                .await?;
            println!("logged in as {}", user.username);

            if let Some(route) = context.take_pending_route().await {
                println!("resuming {}", route.path());
            }
        }
        AccountSubcommand::Logout => {
            context.accounts()?.logout().await?;
            println!("logged out");
        }
        AccountSubcommand::Whoami => match context.current_session().await {
            Some(user) => {
                println!("user_id: {}", user.user_id);
                println!("username: {}", user.username);
                println!("email: {}", user.email);
                println!("logged_in_at: {}", user.logged_in_at);
            }
            None => println!("not logged in"),
        },
    }

    Ok(())
}

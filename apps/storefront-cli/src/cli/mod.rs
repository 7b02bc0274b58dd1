use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use storefront_sync::{AppContext, FileKeyValueStore, StorefrontConfig, SyncMode};

use crate::backend::Backend;
use crate::error::{CliError, CliResult};

mod account;
mod categories;
mod link;
mod products;
mod status;
mod storage;
mod theme;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront product list", long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Sync mode override: online or offline
    #[arg(long, global = true)]
    mode: Option<SyncMode>,

    /// Data directory override
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Products(products::ProductsCommand),
    Categories(categories::CategoriesCommand),
    Theme(theme::ThemeCommand),
    Link(link::LinkCommand),
    Account(account::AccountCommand),
    Storage(storage::StorageCommand),
    Status(status::StatusArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> CliResult<()> {
        let config = self.load_config()?;
        let session = Session::open(config).await?;

        let result = match self.command {
            Commands::Products(command) => products::run(command, &session).await,
            Commands::Categories(command) => categories::run(command, &session).await,
            Commands::Theme(command) => theme::run(command, &session).await,
            Commands::Link(command) => link::run(command, &session).await,
            Commands::Account(command) => account::run(command, &session).await,
            Commands::Storage(command) => storage::run(command, &session).await,
            Commands::Status(args) => status::run(args, &session).await,
        };

        let closed = session.close().await;
        result.and(closed)
    }

    /// Config file and env first, then command line flags on top.
    fn load_config(&self) -> CliResult<StorefrontConfig> {
        let mut config = StorefrontConfig::load(self.config.clone())?;

        if let Some(mode) = self.mode {
            config.sync.mode = mode;
        }
        if let Some(ref dir) = self.data_dir {
            config.storage.data_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Everything one command run needs: the app context and, when online,
/// the backend file it syncs against.
pub(crate) struct Session {
    pub(crate) context: AppContext,
    backend: Option<Backend>,
}

impl Session {
    async fn open(config: StorefrontConfig) -> CliResult<Self> {
        let data_dir = config
            .data_dir()
            .ok_or_else(|| CliError::config("Could not determine a data directory; pass --data-dir"))?;
        tokio::fs::create_dir_all(&data_dir).await?;
        info!(data_dir = %data_dir.display(), mode = %config.mode(), "Opening storefront");

        let backend = if config.is_sync_enabled() {
            Some(Backend::open(&data_dir).await?)
        } else {
            None
        };

        let mut builder =
            AppContext::builder(config).with_storage(Arc::new(FileKeyValueStore::in_dir(&data_dir)));
        if let Some(ref backend) = backend {
            builder = builder.with_service(backend.service());
        }

        let context = builder.build()?;
        let outcome = context.init().await;
        debug!(?outcome, "Context ready");

        Ok(Session { context, backend })
    }

    async fn close(self) -> CliResult<()> {
        self.context.shutdown().await;
        if let Some(ref backend) = self.backend {
            backend.save().await?;
        }
        Ok(())
    }
}

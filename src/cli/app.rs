use super::ui;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inventorydb::connection::config::DEFAULT_DATABASE_NAME;
use inventorydb::{
    DeviceListing, DeviceStatus, DeviceStore, DurabilityMode, StatusFilter, StoreConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "inventorydb")]
#[command(about = "Seed, list, edit and delete devices in a local inventory database")]
pub struct Cli {
    /// Storage origin holding every database
    #[arg(long, default_value = "./inventorydb-data")]
    data_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
    database: String,

    /// Database location as inventorydb://<data-dir>/<database>
    #[arg(long, conflicts_with_all = ["data_dir", "database"])]
    url: Option<String>,

    /// fsync every write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recreate the database and load the demo devices
    Init,
    /// Print total and per-status counts
    Count,
    List {
        #[arg(long, default_value = "all")]
        filter: StatusFilter,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Devices per page [default: 12]
        #[arg(long)]
        per_page: Option<usize>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    Show {
        serial: String,
    },
    Update {
        serial: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<DeviceStatus>,
    },
    Delete {
        serial: String,
    },
    /// Delete every database under the data directory
    Wipe {
        /// Confirm the full reset
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    fn config(&self) -> Result<StoreConfig> {
        let durability = if self.sync { DurabilityMode::Sync } else { DurabilityMode::Async };
        let config = match &self.url {
            Some(url) => StoreConfig::from_url(url).map_err(anyhow::Error::msg)?,
            None => StoreConfig::new(&self.data_dir).database(&self.database),
        }
        .durability(durability);
        Ok(match self.command {
            Command::List { per_page: Some(per_page), .. } => config.items_per_page(per_page),
            _ => config,
        })
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config()?;
        let store = Arc::new(DeviceStore::open(config).context("Invalid store configuration")?);

        match self.command {
            Command::Init => {
                store.initialize().await.context("Failed to initialize database")?;
                let count = store.count().await?;
                println!("{} initialized with {} devices", store.config().to_url(), count);
            }
            Command::Count => {
                let stats = store.stats().await.context("Failed to count devices")?;
                println!("{}", stats);
            }
            Command::List { filter, page, json, .. } => {
                let per_page = store.config().items_per_page;
                let mut listing = DeviceListing::load(store, per_page, filter)
                    .await
                    .context("Failed to fetch devices")?;
                if page != 1 && !listing.go_to_page(page) {
                    warn!(page, total_pages = listing.total_pages(), "Page out of range, showing page 1");
                }
                if json {
                    println!("{}", serde_json::to_string_pretty(listing.current_items())?);
                } else {
                    ui::print_devices(listing.current_items());
                    ui::print_page_footer(&listing);
                }
            }
            Command::Show { serial } => match store.get(&serial).await? {
                Some(device) => ui::print_device(&device),
                None => bail!("Device '{}' not found", serial),
            },
            Command::Update { serial, name, status } => {
                let Some(mut device) = store.get(&serial).await? else {
                    bail!("Device '{}' not found", serial);
                };
                if name.is_none() && status.is_none() {
                    bail!("Nothing to update: pass --name and/or --status");
                }
                if let Some(name) = name {
                    device.name = name;
                }
                if let Some(status) = status {
                    device.status = status;
                }
                let per_page = store.config().items_per_page;
                let mut listing = DeviceListing::new(store, per_page);
                listing
                    .save(&serial, device.clone())
                    .await
                    .with_context(|| format!("Failed to update device '{}'", serial))?;
                ui::print_device(&device);
            }
            Command::Delete { serial } => {
                store
                    .delete(&serial)
                    .await
                    .with_context(|| format!("Failed to delete device '{}'", serial))?;
                println!("Device '{}' deleted", serial);
            }
            Command::Wipe { yes } => {
                if !yes {
                    bail!(
                        "Refusing to wipe '{}' without --yes: every database under it is removed",
                        store.origin().root().display()
                    );
                }
                store.wipe_all().await.context("Failed to delete databases")?;
                println!("All databases deleted");
            }
        }
        Ok(())
    }
}

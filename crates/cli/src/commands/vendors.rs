use api_types::directory::VendorNew;
use clap::{Args, Subcommand};
use client::Api;

use crate::commands::CommandResult;

#[derive(Args, Debug)]
pub struct VendorsArgs {
    #[command(subcommand)]
    command: VendorsCommand,
}

#[derive(Subcommand, Debug)]
enum VendorsCommand {
    /// List vendors.
    List,
    /// Create a vendor.
    Create { name: String },
}

pub async fn run(api: &Api, args: VendorsArgs) -> CommandResult {
    match args.command {
        VendorsCommand::List => {
            for vendor in api.vendors_list().await? {
                println!("  {:>6}  {}", vendor.id, vendor.name);
            }
        }
        VendorsCommand::Create { name } => {
            let created = api.vendor_create(&VendorNew { name }).await?;
            println!("created vendor {} ({})", created.id, created.name);
        }
    }
    Ok(())
}

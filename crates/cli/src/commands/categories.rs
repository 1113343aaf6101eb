use api_types::category::CategoryNew;
use clap::{Args, Subcommand};
use client::Api;

use crate::commands::CommandResult;

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    command: CategoriesCommand,
}

#[derive(Subcommand, Debug)]
enum CategoriesCommand {
    /// List expense categories.
    List,
    /// Create an expense category.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

pub async fn run(api: &Api, args: CategoriesArgs) -> CommandResult {
    match args.command {
        CategoriesCommand::List => {
            for category in api.categories_list().await? {
                match &category.description {
                    Some(description) => {
                        println!("  {:>6}  {:<24}  {description}", category.id, category.name);
                    }
                    None => println!("  {:>6}  {}", category.id, category.name),
                }
            }
        }
        CategoriesCommand::Create { name, description } => {
            let created = api.category_create(&CategoryNew { name, description }).await?;
            println!("created category {} ({})", created.id, created.name);
        }
    }
    Ok(())
}

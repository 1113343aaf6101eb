use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::{CommandResult, assign, categories, expenses, import, recurring, targets, vendors};

#[derive(Parser, Debug)]
#[command(name = "outlay")]
#[command(about = "Expense tracking client: listing, CSV import, allocations, recurring templates")]
struct Cli {
    #[command(flatten)]
    global: config::GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse, create, export and delete expenses.
    Expenses(expenses::ExpensesArgs),
    /// Import expenses from a CSV file.
    Import(import::ImportArgs),
    /// Assign expenses to an invoice, project, payment or contact.
    Assign(assign::AssignArgs),
    /// Manage recurring expense templates.
    Recurring(recurring::RecurringArgs),
    /// List the records expenses can be allocated against.
    Targets(targets::TargetsArgs),
    /// Manage expense categories.
    Categories(categories::CategoriesArgs),
    /// Manage vendors.
    Vendors(vendors::VendorsArgs),
}

#[tokio::main]
async fn main() -> CommandResult {
    let cli = Cli::parse();
    let settings = config::load(&cli.global)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "outlay={level},client={level},engine={level}",
            level = settings.log_level
        ))
        .init();
    tracing::debug!(base_url = %settings.base_url, "configuration resolved");

    let api = settings.api();
    match cli.command {
        Command::Expenses(args) => expenses::run(&api, &settings, args).await,
        Command::Import(args) => import::run(&api, &settings, args).await,
        Command::Assign(args) => assign::run(&api, args).await,
        Command::Recurring(args) => recurring::run(&api, args).await,
        Command::Targets(args) => targets::run(&api, args).await,
        Command::Categories(args) => categories::run(&api, args).await,
        Command::Vendors(args) => vendors::run(&api, args).await,
    }
}

use api_types::expense::{CustomPeriod, Expense, RecurringStatus, RecurringType};
use clap::{Args, Subcommand};
use client::{Api, generate_next_child, recurring_children, set_recurring_status};
use engine::{INFINITE_OCCURRENCES, format_amount, next_billing_date};

use crate::commands::{CommandResult, confirm};

#[derive(Args, Debug)]
pub struct RecurringArgs {
    #[command(subcommand)]
    command: RecurringCommand,
}

#[derive(Subcommand, Debug)]
enum RecurringCommand {
    /// Show a template's cadence, status and next billing date.
    Show { id: i64 },
    /// Stop generating children until the template is resumed.
    Pause { id: i64 },
    /// Resume a paused template.
    Resume { id: i64 },
    /// Cancel a template for good; a cancelled template cannot restart.
    Cancel {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// List the expenses generated from a template.
    Children { id: i64 },
    /// Generate the next child expense now.
    GenerateNext { id: i64 },
}

fn cadence_line(template: &Expense) -> String {
    match template.recurring_type {
        None => "unset".to_string(),
        Some(RecurringType::Weekly) => "weekly".to_string(),
        Some(RecurringType::Monthly) => "monthly".to_string(),
        Some(RecurringType::Yearly) => "yearly".to_string(),
        Some(RecurringType::Custom) => match (template.custom_every, template.custom_period) {
            (Some(every), Some(period)) => {
                let unit = match period {
                    CustomPeriod::Days => "day(s)",
                    CustomPeriod::Weeks => "week(s)",
                    CustomPeriod::Months => "month(s)",
                    CustomPeriod::Years => "year(s)",
                };
                format!("every {every} {unit}")
            }
            _ => "custom (incomplete)".to_string(),
        },
    }
}

fn show(template: &Expense) {
    let status = template.recurring_status.map_or("active", |s| s.as_str());
    let occurrences = match template.recurring_number {
        Some(INFINITE_OCCURRENCES) => "infinite".to_string(),
        Some(n) => n.to_string(),
        None => "-".to_string(),
    };
    println!(
        "template {} ({})",
        template.id,
        template.expense_number.as_deref().unwrap_or("unnumbered")
    );
    println!("  cadence:     {}", cadence_line(template));
    println!("  status:      {status}");
    println!("  occurrences: {occurrences}");
    match next_billing_date(template) {
        Ok(date) => println!("  next billing: {date}"),
        Err(err) => println!("  next billing: unavailable ({err})"),
    }
}

pub async fn run(api: &Api, args: RecurringArgs) -> CommandResult {
    match args.command {
        RecurringCommand::Show { id } => {
            let template = api.expense_get(id).await?;
            show(&template);
        }
        RecurringCommand::Pause { id } => {
            let template = api.expense_get(id).await?;
            let updated = set_recurring_status(api, &template, RecurringStatus::Paused).await?;
            println!("paused template {}", updated.id);
        }
        RecurringCommand::Resume { id } => {
            let template = api.expense_get(id).await?;
            let updated = set_recurring_status(api, &template, RecurringStatus::Active).await?;
            println!("resumed template {}", updated.id);
        }
        RecurringCommand::Cancel { id, yes } => {
            if !yes && !confirm(&format!("cancel template {id}? This cannot be undone."))? {
                println!("aborted");
                return Ok(());
            }
            let template = api.expense_get(id).await?;
            let updated = set_recurring_status(api, &template, RecurringStatus::Cancelled).await?;
            println!("cancelled template {}", updated.id);
        }
        RecurringCommand::Children { id } => {
            let template = api.expense_get(id).await?;
            let children = recurring_children(api, &template).await?;
            if children.items.is_empty() {
                println!("no children generated yet");
            }
            for child in &children.items {
                println!(
                    "  {:>6}  {:<10}  {}  {:>14}",
                    child.id,
                    child.expense_number.as_deref().unwrap_or("-"),
                    child.expense_date,
                    format_amount(child.amount, &child.currency.symbol),
                );
            }
        }
        RecurringCommand::GenerateNext { id } => {
            let template = api.expense_get(id).await?;
            let child = generate_next_child(api, &template).await?;
            println!(
                "generated expense {} ({}) dated {}",
                child.id,
                child.expense_number.as_deref().unwrap_or("unnumbered"),
                child.expense_date
            );
        }
    }
    Ok(())
}

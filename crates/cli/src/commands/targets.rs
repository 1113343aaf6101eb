use api_types::allocation::EntityType;
use clap::Args;
use client::Api;
use engine::{entity_meta, format_amount};

use crate::commands::CommandResult;

#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Kind of record to list (invoice, project, payment, contact).
    #[arg(value_parser = parse_kind)]
    kind: EntityType,
}

fn parse_kind(raw: &str) -> Result<EntityType, String> {
    EntityType::try_from(raw)
}

pub async fn run(api: &Api, args: TargetsArgs) -> CommandResult {
    println!("{}s:", entity_meta(args.kind).label.to_lowercase());
    match args.kind {
        EntityType::Invoice => {
            let page = api.invoices_list().await?;
            for invoice in &page.items {
                println!(
                    "  {:>6}  {:<12}  {:>14}",
                    invoice.id,
                    invoice.invoice_number,
                    format_amount(invoice.total, &invoice.currency.symbol),
                );
            }
        }
        EntityType::Project => {
            for project in api.projects_list().await? {
                println!("  {:>6}  {}", project.id, project.name);
            }
        }
        EntityType::Payment => {
            for payment in api.payments_list().await? {
                println!("  {:>6}  {}", payment.id, payment.reference);
            }
        }
        EntityType::Contact => {
            for contact in api.contacts_list().await? {
                println!("  {:>6}  {}", contact.id, contact.name);
            }
        }
    }
    Ok(())
}

use clap::Args;
use client::{Api, AssignmentSession};
use engine::{EntityRef, format_amount};

use crate::commands::{CommandResult, parse_entity};

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Allocation target, written as TYPE:ID, e.g. invoice:12.
    #[arg(value_parser = parse_entity)]
    target: EntityRef,
    /// Assign an expense at 100%, or at PCT with ID:PCT (repeatable).
    #[arg(long = "add", value_parser = parse_assignment)]
    add: Vec<(i64, Option<String>)>,
    /// Unassign an expense (repeatable).
    #[arg(long = "remove")]
    remove: Vec<i64>,
    /// Change an assigned expense's share, written as ID:PCT (repeatable).
    #[arg(long = "set", value_parser = parse_share)]
    set: Vec<(i64, String)>,
    /// Print the result without saving.
    #[arg(long)]
    dry_run: bool,
}

fn parse_expense_id(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid expense id \"{raw}\": {err}"))
}

fn parse_assignment(raw: &str) -> Result<(i64, Option<String>), String> {
    match raw.split_once(':') {
        Some((id, percentage)) => Ok((parse_expense_id(id)?, Some(percentage.to_string()))),
        None => Ok((parse_expense_id(raw)?, None)),
    }
}

fn parse_share(raw: &str) -> Result<(i64, String), String> {
    let (id, percentage) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ID:PCT, got \"{raw}\""))?;
    Ok((parse_expense_id(id)?, percentage.to_string()))
}

pub async fn run(api: &Api, args: AssignArgs) -> CommandResult {
    let mut session = AssignmentSession::load(api, args.target).await?;

    for (id, percentage) in &args.add {
        let expense = api.expense_get(*id).await?;
        session.add(api, expense).await?;
        if let Some(percentage) = percentage {
            session.set_percentage(*id, percentage)?;
        }
    }
    for id in &args.remove {
        session.remove(*id)?;
    }
    for (id, percentage) in &args.set {
        session.set_percentage(*id, percentage)?;
    }

    println!(
        "{} expense(s) assigned to {}",
        session.rows().len(),
        session.target()
    );
    for row in session.rows() {
        let marker = if row.is_new { "  (new)" } else { "" };
        println!(
            "  {:>6}  {:<10}  {:>14}  {:>5.1}%{marker}",
            row.expense.id,
            row.expense.expense_number.as_deref().unwrap_or("-"),
            format_amount(row.expense.amount, &row.expense.currency.symbol),
            row.percentage,
        );
    }

    if let Some(report) = session.capacity_report(api).await {
        println!(
            "  invoice capacity: {:.2} here + {:.2} elsewhere of {:.2}, {:.2} remaining",
            report.assigned_total,
            report.baseline_total,
            report.invoice_total,
            report.remaining(),
        );
        if report.is_over_allocated {
            println!("  warning: over the invoice total");
        }
    }

    if args.dry_run {
        println!("dry run, nothing saved");
        return Ok(());
    }

    let report = session.save(api).await?;
    println!("saved {} expense(s)", report.saved.len());
    for (id, err) in &report.failed {
        eprintln!("  expense {id}: {err}");
    }
    if !report.all_saved() {
        std::process::exit(1);
    }
    Ok(())
}

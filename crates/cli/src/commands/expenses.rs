use std::path::PathBuf;

use api_types::expense::{
    CustomPeriod, Expense, ExpenseNew, ExpenseStatus, PricingType, RecurringType,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use client::{Api, Debouncer, ExpenseList};
use engine::{
    AllocationEditor, AllocationStatus, Cadence, EntityRef, ExpenseFilter, ExpenseSort,
    INFINITE_OCCURRENCES, SortDir, SortField, allocated_amount, entity_meta, format_amount,
    next_billing_date, parse_amount, total_percentage, validate_recurring_number,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{CommandResult, confirm, parse_date_arg, parse_entity, parse_entity_share};
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct ExpensesArgs {
    #[command(subcommand)]
    command: ExpensesCommand,
}

#[derive(Subcommand, Debug)]
enum ExpensesCommand {
    /// List expenses with filters, sorting and paging.
    List(ListArgs),
    /// Search expenses interactively, one term per line.
    Search,
    /// Show one expense with its allocations.
    Show { id: i64 },
    /// Create an expense, optionally as a recurring template.
    Create(CreateArgs),
    /// Delete an expense.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Export the filtered expense list as CSV.
    Export(ExportArgs),
    /// Edit the allocation rows of one expense.
    Allocations(AllocationsArgs),
    /// Print the number the next expense will receive.
    NextNumber,
}

/// Filter flags shared by `list` and `export`.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Filter by status (pending, paid, completed, cancelled).
    #[arg(long, value_parser = parse_status)]
    status: Option<ExpenseStatus>,
    /// Filter by category id.
    #[arg(long)]
    category: Option<i64>,
    /// Filter by vendor id.
    #[arg(long)]
    vendor: Option<i64>,
    /// Filter by project id.
    #[arg(long)]
    project: Option<i64>,
    /// Filter by contact id.
    #[arg(long)]
    contact: Option<i64>,
    /// Earliest date to include (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg)]
    from: Option<NaiveDate>,
    /// First date past the range (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg)]
    to: Option<NaiveDate>,
    /// Substring match on number, description, reference or vendor name.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            status: self.status,
            category_id: self.category,
            vendor_id: self.vendor,
            project_id: self.project,
            contact_id: self.contact,
            date_from: self.from,
            date_to: self.to,
            search: self.search.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Sort column (date, amount, number, status, vendor).
    #[arg(long, value_parser = parse_sort_field)]
    sort: Option<SortField>,
    /// Sort direction (asc, desc).
    #[arg(long, value_parser = parse_sort_dir)]
    dir: Option<SortDir>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    per_page: Option<u32>,
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Amount in major units, e.g. 12.50.
    #[arg(long)]
    amount: String,
    /// ISO currency code; defaults to the configured one.
    #[arg(long)]
    currency: Option<String>,
    /// Expense date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    vendor: Option<i64>,
    #[arg(long)]
    project: Option<i64>,
    #[arg(long)]
    contact: Option<i64>,
    #[arg(long)]
    payment_method: Option<String>,
    #[arg(long)]
    reference: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Make this a recurring template (weekly, monthly, yearly, custom).
    #[arg(long, value_parser = parse_recurring_type)]
    recurring: Option<RecurringType>,
    /// Interval count for a custom cadence.
    #[arg(long)]
    every: Option<u32>,
    /// Interval unit for a custom cadence (days, weeks, months, years).
    #[arg(long, value_parser = parse_custom_period)]
    period: Option<CustomPeriod>,
    /// Occurrences for a template; -1 means infinite.
    #[arg(long, allow_hyphen_values = true)]
    occurrences: Option<i32>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Output file.
    #[arg(long, default_value = "expenses.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AllocationsArgs {
    /// Expense to edit.
    id: i64,
    /// Add a row at the remaining capacity (TYPE:ID, repeatable).
    #[arg(long = "add", value_parser = parse_entity)]
    add: Vec<EntityRef>,
    /// Set a row's percentage (TYPE:ID:PCT, repeatable; adds the row when
    /// absent).
    #[arg(long = "set", value_parser = parse_entity_share)]
    set: Vec<(EntityRef, String)>,
    /// Remove a row (TYPE:ID, repeatable).
    #[arg(long = "remove", value_parser = parse_entity)]
    remove: Vec<EntityRef>,
    /// Print the result without saving.
    #[arg(long)]
    dry_run: bool,
}

fn parse_status(raw: &str) -> Result<ExpenseStatus, String> {
    ExpenseStatus::try_from(raw)
}

fn parse_sort_field(raw: &str) -> Result<SortField, String> {
    SortField::try_from(raw)
}

fn parse_sort_dir(raw: &str) -> Result<SortDir, String> {
    SortDir::try_from(raw)
}

fn parse_recurring_type(raw: &str) -> Result<RecurringType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "weekly" => Ok(RecurringType::Weekly),
        "monthly" => Ok(RecurringType::Monthly),
        "yearly" => Ok(RecurringType::Yearly),
        "custom" => Ok(RecurringType::Custom),
        other => Err(format!("unknown recurring type: {other}")),
    }
}

fn parse_custom_period(raw: &str) -> Result<CustomPeriod, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "days" => Ok(CustomPeriod::Days),
        "weeks" => Ok(CustomPeriod::Weeks),
        "months" => Ok(CustomPeriod::Months),
        "years" => Ok(CustomPeriod::Years),
        other => Err(format!("unknown custom period: {other}")),
    }
}

fn status_word(status: AllocationStatus) -> &'static str {
    match status {
        AllocationStatus::Unallocated => "unallocated",
        AllocationStatus::Partial => "partially allocated",
        AllocationStatus::Full => "fully allocated",
        AllocationStatus::Over => "over-allocated",
    }
}

pub async fn run(api: &Api, settings: &AppConfig, args: ExpensesArgs) -> CommandResult {
    match args.command {
        ExpensesCommand::List(args) => list(api, settings, args).await,
        ExpensesCommand::Search => search(api, settings).await,
        ExpensesCommand::Show { id } => show(api, id).await,
        ExpensesCommand::Create(args) => create(api, settings, args).await,
        ExpensesCommand::Delete { id, yes } => delete(api, id, yes).await,
        ExpensesCommand::Export(args) => export(api, settings, args).await,
        ExpensesCommand::Allocations(args) => allocations(api, args).await,
        ExpensesCommand::NextNumber => {
            let next = api.expense_next_number().await?;
            println!("{}", next.next_number);
            Ok(())
        }
    }
}

fn expense_line(expense: &Expense, vendor: Option<&str>) -> String {
    format!(
        "{:>6}  {:<10}  {}  {:<9}  {:>14}  {}",
        expense.id,
        expense.expense_number.as_deref().unwrap_or("-"),
        expense.expense_date,
        expense.status.as_str(),
        format_amount(expense.amount, &expense.currency.symbol),
        vendor
            .or(expense.description.as_deref())
            .unwrap_or_default(),
    )
}

async fn list(api: &Api, settings: &AppConfig, args: ListArgs) -> CommandResult {
    let mut list = ExpenseList::new(args.per_page.unwrap_or(settings.per_page));
    list.filter = args.filter.to_filter();
    list.order_by(ExpenseSort::new(
        args.sort.unwrap_or_default(),
        args.dir.unwrap_or_default(),
    ));
    list.set_page(args.page);
    list.load_vendors(api).await?;
    list.refresh(api).await?;

    for expense in list.visible() {
        println!("{}", expense_line(expense, list.vendor_name(expense)));
    }

    let summary = list.summary();
    println!();
    println!(
        "page {} of {} ({} matching)",
        list.page(),
        list.pages(),
        list.total()
    );
    for (code, total) in &summary.totals_by_currency {
        println!("  {code} on this page: {total:.2}");
    }
    if summary.fully_allocated > 0 {
        println!(
            "  fully allocated: {} of {}",
            summary.fully_allocated, summary.count
        );
    }
    Ok(())
}

/// Reads one search term per line from stdin. A newer line supersedes
/// the pending one, so only the latest term is looked up once input
/// goes quiet.
async fn search(api: &Api, settings: &AppConfig) -> CommandResult {
    let mut debouncer = Debouncer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("search term per line, empty line quits");
    while let Some(line) = lines.next_line().await? {
        let term = line.trim().to_string();
        if term.is_empty() {
            break;
        }
        let api = api.clone();
        let per_page = settings.per_page;
        debouncer.submit(move || async move {
            if let Err(err) = search_once(&api, per_page, &term).await {
                eprintln!("search failed: {err}");
            }
        });
    }
    Ok(())
}

async fn search_once(api: &Api, per_page: u32, term: &str) -> CommandResult {
    let mut list = ExpenseList::new(per_page);
    list.filter.search = Some(term.to_string());
    list.load_vendors(api).await?;
    list.refresh(api).await?;

    for expense in list.visible() {
        println!("{}", expense_line(expense, list.vendor_name(expense)));
    }
    println!("({} matching {term})", list.total());
    Ok(())
}

async fn show(api: &Api, id: i64) -> CommandResult {
    let expense = api.expense_get(id).await?;
    let allocations = api.allocations_get(id).await?.allocations;

    println!(
        "expense {} ({})",
        expense.id,
        expense.expense_number.as_deref().unwrap_or("unnumbered")
    );
    println!("  date:   {}", expense.expense_date);
    println!("  status: {}", expense.status.as_str());
    println!(
        "  amount: {}",
        format_amount(expense.amount, &expense.currency.symbol)
    );
    if let Some(description) = &expense.description {
        println!("  note:   {description}");
    }

    if allocations.is_empty() {
        println!("  allocations: none");
    } else {
        let total = total_percentage(&allocations);
        println!(
            "  allocations, {:.1}% ({}):",
            total,
            status_word(AllocationStatus::from_total(total))
        );
        for entry in &allocations {
            let meta = entity_meta(entry.entity_type);
            println!(
                "    {} #{}: {:.1}% = {}",
                meta.label,
                entry.entity_id,
                entry.percentage,
                format_amount(
                    allocated_amount(expense.amount, entry.percentage),
                    &expense.currency.symbol
                )
            );
        }
    }

    if expense.pricing_type == PricingType::Recurring {
        let status = expense.recurring_status.map_or("active", |s| s.as_str());
        let occurrences = match expense.recurring_number {
            Some(INFINITE_OCCURRENCES) => "infinite".to_string(),
            Some(n) => n.to_string(),
            None => "-".to_string(),
        };
        println!("  recurring: {status}, {occurrences} occurrence(s) left");
        match next_billing_date(&expense) {
            Ok(date) => println!("  next billing: {date}"),
            Err(err) => println!("  next billing: unavailable ({err})"),
        }
    }
    Ok(())
}

async fn create(api: &Api, settings: &AppConfig, args: CreateArgs) -> CommandResult {
    let amount = parse_amount(&args.amount)?;
    let expense_date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let currency_code = args
        .currency
        .unwrap_or_else(|| settings.default_currency.clone())
        .to_uppercase();

    let mut new = ExpenseNew {
        amount,
        currency_code,
        expense_date,
        description: args.description,
        category_id: args.category,
        vendor_id: args.vendor,
        project_id: args.project,
        contact_id: args.contact,
        payment_method: args.payment_method,
        reference_number: args.reference,
        notes: args.notes,
        ..ExpenseNew::default()
    };

    if let Some(recurring_type) = args.recurring {
        Cadence::from_fields(Some(recurring_type), args.every, args.period)?;
        if let Some(occurrences) = args.occurrences {
            validate_recurring_number(occurrences)?;
        }
        new.pricing_type = Some(PricingType::Recurring);
        new.recurring_type = Some(recurring_type);
        new.custom_every = args.every;
        new.custom_period = args.period;
        new.recurring_number = args.occurrences;
    }

    let created = api.expense_create(&new).await?;
    println!(
        "created expense {} ({})",
        created.id,
        created.expense_number.as_deref().unwrap_or("unnumbered")
    );
    Ok(())
}

async fn delete(api: &Api, id: i64, yes: bool) -> CommandResult {
    if !yes && !confirm(&format!("delete expense {id}?"))? {
        println!("aborted");
        return Ok(());
    }
    api.expense_delete(id).await?;
    println!("deleted expense {id}");
    Ok(())
}

async fn export(api: &Api, settings: &AppConfig, args: ExportArgs) -> CommandResult {
    let filter = args.filter.to_filter();
    filter.validate()?;

    // Export covers every matching row, not one page.
    let mut params = filter.to_params(1, settings.per_page, ExpenseSort::default());
    params.page = None;
    params.per_page = None;

    let bytes = api.expenses_export(&params).await?;
    std::fs::write(&args.output, &bytes)?;
    println!("wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

fn position(editor: &AllocationEditor, target: EntityRef) -> Option<usize> {
    editor
        .rows()
        .iter()
        .position(|row| row.entity_type == target.kind && row.entity_id == target.id)
}

fn print_rows(expense: &Expense, editor: &AllocationEditor) {
    for (index, row) in editor.rows().iter().enumerate() {
        let meta = entity_meta(row.entity_type);
        println!(
            "  {} #{}: {:.1}% = {}",
            meta.label,
            row.entity_id,
            row.percentage,
            format_amount(
                editor.row_amount(index).unwrap_or(0.0),
                &expense.currency.symbol
            )
        );
    }
    println!(
        "  total {:.1}% ({}), remaining {:.1}%",
        editor.total_percentage(),
        status_word(editor.status()),
        editor.remaining_capacity()
    );
}

async fn allocations(api: &Api, args: AllocationsArgs) -> CommandResult {
    let expense = api.expense_get(args.id).await?;
    let current = api.allocations_get(args.id).await?.allocations;
    let mut editor = AllocationEditor::new(expense.amount, current);

    for target in &args.add {
        editor.add_row(*target)?;
    }
    for (target, percentage) in &args.set {
        let index = match position(&editor, *target) {
            Some(index) => index,
            None => {
                editor.add_row(*target)?;
                editor.rows().len() - 1
            }
        };
        editor.set_percentage(index, percentage)?;
    }
    for target in &args.remove {
        let index =
            position(&editor, *target).ok_or_else(|| format!("no allocation for {target}"))?;
        editor.remove_row(index)?;
    }

    print_rows(&expense, &editor);
    editor.validate()?;

    if args.dry_run {
        println!("dry run, nothing saved");
        return Ok(());
    }

    let payload = editor.into_payload()?;
    api.allocations_update(expense.id, &payload).await?;
    println!("saved");
    Ok(())
}

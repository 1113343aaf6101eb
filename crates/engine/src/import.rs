//! CSV import: parsing and row validation.
//!
//! The import flow parses the whole file up front, validates every row
//! independently against the caller's known currencies, categories and
//! vendors, and only then creates expenses one row at a time. Everything
//! in this module is pure; the sequential create calls live with the
//! client driving the flow.

use std::collections::HashSet;
use std::io;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::money::parse_amount;
use crate::util::{normalize_name, parse_date};
use crate::{EngineError, ResultEngine};

/// Number of parsed rows shown in the preview table. Validation and the
/// import itself always cover the full file.
pub const PREVIEW_LIMIT: usize = 50;

/// Header names the parser recognizes, matched case-insensitively.
/// Unrecognized columns are ignored.
pub const RECOGNIZED_COLUMNS: [&str; 9] = [
    "expense_date",
    "amount",
    "currency",
    "description",
    "category",
    "vendor",
    "payment_method",
    "reference_number",
    "notes",
];

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: [&str; 2] = ["expense_date", "amount"];

/// One raw CSV row. Fields are trimmed; empty cells become `None`.
///
/// `row_number` is the 1-indexed position in the file, starting at 2
/// because row 1 is the header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvRow {
    pub row_number: usize,
    pub expense_date: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Column positions resolved from the header row.
#[derive(Clone, Copy, Debug, Default)]
struct HeaderIndex {
    expense_date: Option<usize>,
    amount: Option<usize>,
    currency: Option<usize>,
    description: Option<usize>,
    category: Option<usize>,
    vendor: Option<usize>,
    payment_method: Option<usize>,
    reference_number: Option<usize>,
    notes: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &StringRecord) -> ResultEngine<Self> {
        let mut index = Self::default();
        for (position, name) in headers.iter().enumerate() {
            let slot = match name.trim().to_ascii_lowercase().as_str() {
                "expense_date" => &mut index.expense_date,
                "amount" => &mut index.amount,
                "currency" => &mut index.currency,
                "description" => &mut index.description,
                "category" => &mut index.category,
                "vendor" => &mut index.vendor,
                "payment_method" => &mut index.payment_method,
                "reference_number" => &mut index.reference_number,
                "notes" => &mut index.notes,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(position);
            }
        }
        if index.expense_date.is_none() {
            return Err(EngineError::InvalidCsv(
                "missing required column: expense_date".to_string(),
            ));
        }
        if index.amount.is_none() {
            return Err(EngineError::InvalidCsv(
                "missing required column: amount".to_string(),
            ));
        }
        Ok(index)
    }

    fn row(&self, row_number: usize, record: &StringRecord) -> CsvRow {
        let cell = |slot: Option<usize>| {
            slot.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        CsvRow {
            row_number,
            expense_date: cell(self.expense_date),
            amount: cell(self.amount),
            currency: cell(self.currency),
            description: cell(self.description),
            category: cell(self.category),
            vendor: cell(self.vendor),
            payment_method: cell(self.payment_method),
            reference_number: cell(self.reference_number),
            notes: cell(self.notes),
        }
    }
}

/// Parses a whole CSV file into raw rows.
///
/// Rows may be shorter than the header; missing trailing cells read as
/// empty.
///
/// # Errors
///
/// [`EngineError::InvalidCsv`] when a required column is absent from the
/// header, [`EngineError::Csv`] on malformed input.
pub fn parse_csv<R: io::Read>(reader: R) -> ResultEngine<Vec<CsvRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let index = HeaderIndex::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        rows.push(index.row(i + 2, &record?));
    }
    Ok(rows)
}

/// Import settings chosen by the user before the run starts.
#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Applied to rows that carry no currency of their own.
    pub default_currency: String,
    /// Treat unknown category names as "create on import" instead of a
    /// row error.
    pub create_missing_categories: bool,
    /// Same for vendor names.
    pub create_missing_vendors: bool,
}

impl ImportOptions {
    #[must_use]
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
            create_missing_categories: false,
            create_missing_vendors: false,
        }
    }
}

/// Everything row validation checks against: known currency codes,
/// category and vendor names, and the chosen options.
#[derive(Clone, Debug)]
pub struct ImportContext {
    currencies: HashSet<String>,
    categories: HashSet<String>,
    vendors: HashSet<String>,
    pub options: ImportOptions,
}

impl ImportContext {
    pub fn new<C, K, V>(
        currency_codes: C,
        category_names: K,
        vendor_names: V,
        options: ImportOptions,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        Self {
            currencies: currency_codes
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .collect(),
            categories: category_names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .collect(),
            vendors: vendor_names
                .into_iter()
                .map(|n| normalize_name(n.as_ref()))
                .collect(),
            options,
        }
    }

    #[must_use]
    pub fn has_currency(&self, code: &str) -> bool {
        self.currencies.contains(&code.trim().to_ascii_uppercase())
    }

    #[must_use]
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains(&normalize_name(name))
    }

    #[must_use]
    pub fn has_vendor(&self, name: &str) -> bool {
        self.vendors.contains(&normalize_name(name))
    }
}

/// One problem found in one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIssue {
    pub row: usize,
    pub field: &'static str,
    pub message: String,
}

/// A row that passed validation, ready to become a create call.
///
/// Category and vendor stay as names; the import run resolves them to
/// ids, creating the records first when the options say so.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidRow {
    pub row_number: usize,
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub currency_code: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// A row that failed validation, with every problem found in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidRow {
    pub row_number: usize,
    pub issues: Vec<RowIssue>,
}

/// Split of a parsed file into importable and rejected rows.
#[derive(Clone, Debug, Default)]
pub struct ValidationOutcome {
    pub valid: Vec<ValidRow>,
    pub invalid: Vec<InvalidRow>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    /// All issues across all rejected rows, in row order.
    #[must_use]
    pub fn issues(&self) -> Vec<RowIssue> {
        self.invalid
            .iter()
            .flat_map(|r| r.issues.iter().cloned())
            .collect()
    }
}

/// Validates every parsed row independently.
///
/// A row fails when its date or amount is missing or malformed, its
/// amount is not positive, its currency is not a known code, or it names
/// a category/vendor that does not exist while the matching auto-create
/// option is off. All problems in a row are collected, not just the
/// first.
#[must_use]
pub fn validate_rows(rows: &[CsvRow], ctx: &ImportContext) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for row in rows {
        let mut issues = Vec::new();
        let issue = |field, message: String| RowIssue {
            row: row.row_number,
            field,
            message,
        };

        let expense_date = match &row.expense_date {
            None => {
                issues.push(issue("expense_date", "required".to_string()));
                None
            }
            Some(raw) => match parse_date(raw) {
                Ok(date) => Some(date),
                Err(e) => {
                    issues.push(issue("expense_date", e.to_string()));
                    None
                }
            },
        };

        let amount = match &row.amount {
            None => {
                issues.push(issue("amount", "required".to_string()));
                None
            }
            Some(raw) => match parse_amount(raw) {
                Ok(amount) if amount <= 0.0 => {
                    issues.push(issue("amount", "must be greater than zero".to_string()));
                    None
                }
                Ok(amount) => Some(amount),
                Err(e) => {
                    issues.push(issue("amount", e.to_string()));
                    None
                }
            },
        };

        let currency_code = row
            .currency
            .as_deref()
            .unwrap_or(&ctx.options.default_currency)
            .trim()
            .to_ascii_uppercase();
        if !ctx.has_currency(&currency_code) {
            issues.push(issue("currency", format!("unknown currency: {currency_code}")));
        }

        if let Some(name) = &row.category
            && !ctx.has_category(name)
            && !ctx.options.create_missing_categories
        {
            issues.push(issue("category", format!("unknown category: {name}")));
        }
        if let Some(name) = &row.vendor
            && !ctx.has_vendor(name)
            && !ctx.options.create_missing_vendors
        {
            issues.push(issue("vendor", format!("unknown vendor: {name}")));
        }

        if issues.is_empty()
            && let Some(expense_date) = expense_date
            && let Some(amount) = amount
        {
            outcome.valid.push(ValidRow {
                row_number: row.row_number,
                expense_date,
                amount,
                currency_code,
                description: row.description.clone(),
                category: row.category.clone(),
                vendor: row.vendor.clone(),
                payment_method: row.payment_method.clone(),
                reference_number: row.reference_number.clone(),
                notes: row.notes.clone(),
            });
        } else {
            outcome.invalid.push(InvalidRow {
                row_number: row.row_number,
                issues,
            });
        }
    }
    outcome
}

/// Renders the collected issues as a downloadable CSV report.
///
/// # Errors
///
/// [`EngineError::Csv`] / [`EngineError::InvalidCsv`] if serialization
/// fails.
pub fn error_report_csv(issues: &[RowIssue]) -> ResultEngine<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["row", "field", "message"])?;
    for issue in issues {
        let row = issue.row.to_string();
        writer.write_record([row.as_str(), issue.field, issue.message.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| EngineError::InvalidCsv(e.to_string()))
}

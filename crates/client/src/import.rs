//! CSV import flow.
//!
//! The pipeline walks the stages upload, preview, options, importing and
//! summary. Parsing and validation come from the engine; this module owns
//! the stage machine, name-to-id resolution, optional auto-creation of
//! categories and vendors, and the sequential create loop with per-row
//! progress and failure accumulation.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io;

use api_types::{
    category::{CategoryNew, ExpenseCategory},
    directory::{Vendor, VendorNew},
    expense::{Expense, ExpenseNew},
};
use engine::{
    CsvRow, EngineError, ImportContext, ImportOptions, PREVIEW_LIMIT, RowIssue,
    ValidationOutcome, error_report_csv, normalize_name, parse_csv, validate_rows,
};

use crate::api::{Api, ApiError};
use crate::error::{ClientError, Result};

/// Stage of the import flow. Transitions are linear; only preview and
/// options can navigate back, and nothing can once the run has started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportStage {
    Upload,
    Preview,
    Options,
    Importing,
    Summary,
}

impl ImportStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Preview => "preview",
            Self::Options => "options",
            Self::Importing => "importing",
            Self::Summary => "summary",
        }
    }
}

/// Create operations the import run needs from the backend.
pub trait ImportBackend {
    fn create_expense(
        &self,
        expense: ExpenseNew,
    ) -> impl Future<Output = std::result::Result<Expense, ApiError>> + Send;

    fn create_category(
        &self,
        name: &str,
    ) -> impl Future<Output = std::result::Result<ExpenseCategory, ApiError>> + Send;

    fn create_vendor(
        &self,
        name: &str,
    ) -> impl Future<Output = std::result::Result<Vendor, ApiError>> + Send;
}

impl ImportBackend for Api {
    async fn create_expense(&self, expense: ExpenseNew) -> std::result::Result<Expense, ApiError> {
        self.expense_create(&expense).await
    }

    async fn create_category(
        &self,
        name: &str,
    ) -> std::result::Result<ExpenseCategory, ApiError> {
        self.category_create(&CategoryNew {
            name: name.to_string(),
            description: None,
        })
        .await
    }

    async fn create_vendor(&self, name: &str) -> std::result::Result<Vendor, ApiError> {
        self.vendor_create(&VendorNew {
            name: name.to_string(),
        })
        .await
    }
}

/// Final counts of one run. `failed` covers rows rejected by validation
/// and rows whose create call failed; `errors` lists both kinds.
#[derive(Clone, Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<RowIssue>,
}

/// Drives one CSV import from file upload to summary.
pub struct ImportPipeline {
    stage: ImportStage,
    currencies: Vec<String>,
    /// Normalized category name to id, extended as the run auto-creates.
    category_ids: HashMap<String, i64>,
    vendor_ids: HashMap<String, i64>,
    options: ImportOptions,
    rows: Vec<CsvRow>,
    outcome: ValidationOutcome,
    summary: Option<ImportSummary>,
}

impl ImportPipeline {
    pub fn new(
        currencies: Vec<String>,
        categories: &[ExpenseCategory],
        vendors: &[Vendor],
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            stage: ImportStage::Upload,
            currencies,
            category_ids: categories
                .iter()
                .map(|c| (normalize_name(&c.name), c.id))
                .collect(),
            vendor_ids: vendors
                .iter()
                .map(|v| (normalize_name(&v.name), v.id))
                .collect(),
            options: ImportOptions::new(default_currency),
            rows: Vec::new(),
            outcome: ValidationOutcome::default(),
            summary: None,
        }
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn validation(&self) -> &ValidationOutcome {
        &self.outcome
    }

    /// Rows shown in the preview table, capped at [`PREVIEW_LIMIT`].
    /// Validation always covers the whole file.
    pub fn preview_rows(&self) -> &[CsvRow] {
        &self.rows[..self.rows.len().min(PREVIEW_LIMIT)]
    }

    pub fn summary(&self) -> Option<&ImportSummary> {
        self.summary.as_ref()
    }

    fn context(&self) -> ImportContext {
        ImportContext::new(
            &self.currencies,
            self.category_ids.keys(),
            self.vendor_ids.keys(),
            self.options.clone(),
        )
    }

    fn revalidate(&mut self) {
        self.outcome = validate_rows(&self.rows, &self.context());
    }

    /// Parses and validates the uploaded file, entering the preview stage.
    pub fn load_file<R: io::Read>(&mut self, reader: R) -> Result<()> {
        if self.stage != ImportStage::Upload {
            return Err(ClientError::InvalidStep(format!(
                "cannot load a file from {}",
                self.stage.as_str()
            )));
        }
        let rows = parse_csv(reader)?;
        if rows.is_empty() {
            return Err(EngineError::InvalidCsv("file has no data rows".to_string()).into());
        }
        self.rows = rows;
        self.revalidate();
        self.stage = ImportStage::Preview;
        Ok(())
    }

    pub fn to_options(&mut self) -> Result<()> {
        if self.stage != ImportStage::Preview {
            return Err(ClientError::InvalidStep(format!(
                "cannot open options from {}",
                self.stage.as_str()
            )));
        }
        self.stage = ImportStage::Options;
        Ok(())
    }

    /// Steps back one stage. Only preview and options allow it; a running
    /// or finished import does not.
    pub fn back(&mut self) -> Result<()> {
        match self.stage {
            ImportStage::Preview => {
                self.rows.clear();
                self.outcome = ValidationOutcome::default();
                self.stage = ImportStage::Upload;
                Ok(())
            }
            ImportStage::Options => {
                self.stage = ImportStage::Preview;
                Ok(())
            }
            stage => Err(ClientError::InvalidStep(format!(
                "cannot go back from {}",
                stage.as_str()
            ))),
        }
    }

    /// Replaces the options and re-validates every row against them.
    pub fn set_options(&mut self, options: ImportOptions) -> Result<()> {
        if self.stage != ImportStage::Options {
            return Err(ClientError::InvalidStep(format!(
                "options are not editable from {}",
                self.stage.as_str()
            )));
        }
        self.options = options;
        self.revalidate();
        Ok(())
    }

    /// Issues from the latest validation pass as a downloadable CSV.
    pub fn error_report(&self) -> Result<Vec<u8>> {
        Ok(error_report_csv(&self.outcome.issues())?)
    }

    /// Runs the import: one create call per valid row, strictly in file
    /// order. `on_progress` is called after every processed row with
    /// `(done, total)`.
    ///
    /// Rows rejected by validation are never attempted and count as
    /// failed. A failing create call is recorded and the run continues
    /// with the next row.
    pub async fn run<B, F>(&mut self, backend: &B, mut on_progress: F) -> Result<ImportSummary>
    where
        B: ImportBackend,
        F: FnMut(usize, usize),
    {
        if self.stage != ImportStage::Options {
            return Err(ClientError::InvalidStep(format!(
                "cannot start the import from {}",
                self.stage.as_str()
            )));
        }
        self.stage = ImportStage::Importing;

        let mut summary = ImportSummary {
            imported: 0,
            failed: self.outcome.invalid.len(),
            errors: self.outcome.issues(),
        };

        let category_failures = self
            .create_missing(backend, Missing::Categories)
            .await;
        let vendor_failures = self.create_missing(backend, Missing::Vendors).await;

        let total = self.outcome.valid.len();
        for (index, row) in self.outcome.valid.iter().enumerate() {
            let category_id = match resolve(&self.category_ids, &category_failures, &row.category) {
                Resolved::Id(id) => id,
                Resolved::Failed(message) => {
                    summary.failed += 1;
                    summary.errors.push(RowIssue {
                        row: row.row_number,
                        field: "category",
                        message,
                    });
                    on_progress(index + 1, total);
                    continue;
                }
            };
            let vendor_id = match resolve(&self.vendor_ids, &vendor_failures, &row.vendor) {
                Resolved::Id(id) => id,
                Resolved::Failed(message) => {
                    summary.failed += 1;
                    summary.errors.push(RowIssue {
                        row: row.row_number,
                        field: "vendor",
                        message,
                    });
                    on_progress(index + 1, total);
                    continue;
                }
            };

            let expense = ExpenseNew {
                amount: row.amount,
                currency_code: row.currency_code.clone(),
                expense_date: row.expense_date,
                description: row.description.clone(),
                category_id,
                vendor_id,
                payment_method: row.payment_method.clone(),
                reference_number: row.reference_number.clone(),
                notes: row.notes.clone(),
                ..Default::default()
            };
            match backend.create_expense(expense).await {
                Ok(_) => summary.imported += 1,
                Err(err) => {
                    tracing::warn!(row = row.row_number, error = %err, "expense create failed");
                    summary.failed += 1;
                    summary.errors.push(RowIssue {
                        row: row.row_number,
                        field: "create",
                        message: err.to_string(),
                    });
                }
            }
            on_progress(index + 1, total);
        }

        self.stage = ImportStage::Summary;
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Creates the distinct missing names ahead of the row loop, so each
    /// name is created once no matter how many rows reference it. Returns
    /// the creation failures keyed by normalized name.
    async fn create_missing<B: ImportBackend>(
        &mut self,
        backend: &B,
        kind: Missing,
    ) -> HashMap<String, String> {
        let (enabled, ids) = match kind {
            Missing::Categories => (
                self.options.create_missing_categories,
                &self.category_ids,
            ),
            Missing::Vendors => (self.options.create_missing_vendors, &self.vendor_ids),
        };

        let mut failures = HashMap::new();
        if !enabled {
            return failures;
        }

        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for row in &self.outcome.valid {
            let name = match kind {
                Missing::Categories => &row.category,
                Missing::Vendors => &row.vendor,
            };
            if let Some(name) = name {
                let key = normalize_name(name);
                if !ids.contains_key(&key) && seen.insert(key) {
                    missing.push(name.clone());
                }
            }
        }

        for name in missing {
            let created = match kind {
                Missing::Categories => backend.create_category(&name).await.map(|c| c.id),
                Missing::Vendors => backend.create_vendor(&name).await.map(|v| v.id),
            };
            match created {
                Ok(id) => {
                    let ids = match kind {
                        Missing::Categories => &mut self.category_ids,
                        Missing::Vendors => &mut self.vendor_ids,
                    };
                    ids.insert(normalize_name(&name), id);
                }
                Err(err) => {
                    tracing::warn!(name = %name, error = %err, "auto-create failed");
                    failures.insert(
                        normalize_name(&name),
                        format!("could not create \"{name}\": {err}"),
                    );
                }
            }
        }
        failures
    }
}

#[derive(Clone, Copy)]
enum Missing {
    Categories,
    Vendors,
}

enum Resolved {
    Id(Option<i64>),
    Failed(String),
}

fn resolve(
    ids: &HashMap<String, i64>,
    failures: &HashMap<String, String>,
    name: &Option<String>,
) -> Resolved {
    let Some(name) = name else {
        return Resolved::Id(None);
    };
    let key = normalize_name(name);
    if let Some(&id) = ids.get(&key) {
        return Resolved::Id(Some(id));
    }
    match failures.get(&key) {
        Some(message) => Resolved::Failed(message.clone()),
        // Validation lets an unknown name through only when auto-create
        // is on, and auto-create either inserted the id or recorded a
        // failure. Anything else imports without the link.
        None => Resolved::Id(None),
    }
}

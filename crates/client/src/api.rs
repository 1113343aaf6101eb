use api_types::{
    CurrencyRef, Page,
    allocation::{AllocationsResponse, AllocationsUpdate, EntityType},
    category::{CategoryNew, ExpenseCategory},
    currency::ConvertedAmount,
    directory::{Contact, Payment, Project, Vendor, VendorNew},
    expense::{Expense, ExpenseItems, ExpenseListParams, ExpenseNew, ExpenseUpdate, NextNumber},
    invoice::{AllocationCapacity, Invoice},
};
use engine::{ConvertCurrency, EngineError, ResultEngine};
use reqwest::RequestBuilder;
use serde::Deserialize;

/// HTTP client for the expense backend.
#[derive(Clone, Debug)]
pub struct Api {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Api {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn error_from(resp: reqwest::Response) -> ApiError {
        let status = resp.status();
        let body = resp
            .json::<ErrorBody>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            409 => ApiError::Conflict(body),
            422 => ApiError::Validation(body),
            _ => ApiError::Server(body),
        }
    }

    async fn get_json<TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<TResp, ApiError> {
        let resp = self.authed(self.http.get(self.url(path))).send().await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::error_from(resp).await)
    }

    async fn get_json_query<TQuery, TResp>(
        &self,
        path: &str,
        query: &TQuery,
    ) -> Result<TResp, ApiError>
    where
        TQuery: serde::Serialize + ?Sized,
        TResp: for<'de> serde::Deserialize<'de>,
    {
        let resp = self
            .authed(self.http.get(self.url(path)).query(query))
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::error_from(resp).await)
    }

    async fn get_bytes<TQuery: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        query: &TQuery,
    ) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .authed(self.http.get(self.url(path)).query(query))
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(resp.bytes().await?.to_vec());
        }
        Err(Self::error_from(resp).await)
    }

    async fn post_json<TReq, TResp>(&self, path: &str, body: &TReq) -> Result<TResp, ApiError>
    where
        TReq: serde::Serialize + ?Sized,
        TResp: for<'de> serde::Deserialize<'de>,
    {
        let resp = self
            .authed(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::error_from(resp).await)
    }

    async fn post_empty<TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<TResp, ApiError> {
        let resp = self.authed(self.http.post(self.url(path))).send().await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::error_from(resp).await)
    }

    async fn put_json<TReq, TResp>(&self, path: &str, body: &TReq) -> Result<TResp, ApiError>
    where
        TReq: serde::Serialize + ?Sized,
        TResp: for<'de> serde::Deserialize<'de>,
    {
        let resp = self
            .authed(self.http.put(self.url(path)).json(body))
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(resp.json::<TResp>().await?);
        }
        Err(Self::error_from(resp).await)
    }

    async fn put_json_unit<TReq: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<(), ApiError> {
        let resp = self
            .authed(self.http.put(self.url(path)).json(body))
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(resp).await)
    }

    async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.authed(self.http.delete(self.url(path))).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(resp).await)
    }

    pub async fn expenses_list(
        &self,
        params: &ExpenseListParams,
    ) -> Result<Page<Expense>, ApiError> {
        self.get_json_query("/expenses", params).await
    }

    pub async fn expense_create(&self, expense: &ExpenseNew) -> Result<Expense, ApiError> {
        self.post_json("/expenses", expense).await
    }

    pub async fn expense_next_number(&self) -> Result<NextNumber, ApiError> {
        self.get_json("/expenses/next-number").await
    }

    /// Exports the filtered expense list as CSV bytes.
    pub async fn expenses_export(&self, params: &ExpenseListParams) -> Result<Vec<u8>, ApiError> {
        self.get_bytes("/expenses/export", params).await
    }

    pub async fn expense_get(&self, id: i64) -> Result<Expense, ApiError> {
        self.get_json(&format!("/expenses/{id}")).await
    }

    pub async fn expense_update(
        &self,
        id: i64,
        update: &ExpenseUpdate,
    ) -> Result<Expense, ApiError> {
        self.put_json(&format!("/expenses/{id}"), update).await
    }

    pub async fn expense_delete(&self, id: i64) -> Result<(), ApiError> {
        self.delete_unit(&format!("/expenses/{id}")).await
    }

    pub async fn allocations_get(&self, expense_id: i64) -> Result<AllocationsResponse, ApiError> {
        self.get_json(&format!("/expenses/{expense_id}/allocations"))
            .await
    }

    /// Replaces the full allocation list of one expense.
    pub async fn allocations_update(
        &self,
        expense_id: i64,
        update: &AllocationsUpdate,
    ) -> Result<(), ApiError> {
        self.put_json_unit(&format!("/expenses/{expense_id}/allocations"), update)
            .await
    }

    pub async fn expenses_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<ExpenseItems, ApiError> {
        self.get_json(&format!(
            "/expenses/by-entity/{}/{entity_id}",
            entity_type.as_str()
        ))
        .await
    }

    /// Asks the backend to materialize the next child of a recurring
    /// template.
    pub async fn generate_next(&self, expense_id: i64) -> Result<Expense, ApiError> {
        self.post_empty(&format!("/expenses/{expense_id}/generate-next"))
            .await
    }

    pub async fn recurring_children(&self, expense_id: i64) -> Result<ExpenseItems, ApiError> {
        self.get_json(&format!("/expenses/{expense_id}/recurring-children"))
            .await
    }

    pub async fn invoices_list(&self) -> Result<Page<Invoice>, ApiError> {
        self.get_json("/invoices").await
    }

    pub async fn invoice_get(&self, id: i64) -> Result<Invoice, ApiError> {
        self.get_json(&format!("/invoices/{id}")).await
    }

    pub async fn invoice_allocation_capacity(
        &self,
        id: i64,
    ) -> Result<AllocationCapacity, ApiError> {
        self.get_json(&format!("/invoices/{id}/expense-allocation-capacity"))
            .await
    }

    pub async fn convert_currency(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<ConvertedAmount, ApiError> {
        #[derive(serde::Serialize)]
        struct ConvertQuery<'a> {
            amount: f64,
            from: &'a str,
            to: &'a str,
        }

        self.get_json_query("/currency/convert", &ConvertQuery { amount, from, to })
            .await
    }

    /// Currency table as the backend knows it.
    pub async fn currencies_list(&self) -> Result<Vec<CurrencyRef>, ApiError> {
        self.get_json("/currencies").await
    }

    pub async fn categories_list(&self) -> Result<Vec<ExpenseCategory>, ApiError> {
        self.get_json("/expense-categories").await
    }

    pub async fn category_create(
        &self,
        category: &CategoryNew,
    ) -> Result<ExpenseCategory, ApiError> {
        self.post_json("/expense-categories", category).await
    }

    pub async fn vendors_list(&self) -> Result<Vec<Vendor>, ApiError> {
        self.get_json("/vendors").await
    }

    pub async fn vendor_create(&self, vendor: &VendorNew) -> Result<Vendor, ApiError> {
        self.post_json("/vendors", vendor).await
    }

    pub async fn projects_list(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("/projects").await
    }

    pub async fn contacts_list(&self) -> Result<Vec<Contact>, ApiError> {
        self.get_json("/contacts").await
    }

    pub async fn payments_list(&self) -> Result<Vec<Payment>, ApiError> {
        self.get_json("/payments").await
    }
}

impl ConvertCurrency for Api {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> ResultEngine<f64> {
        let converted = self
            .convert_currency(amount, from, to)
            .await
            .map_err(|err| EngineError::Conversion(err.to_string()))?;
        Ok(converted.amount)
    }
}

//! Extraction orchestrator
//!
//! CACHE CHECK → CONSENT → ACCOUNTS → BALANCES → TRANSACTIONS →
//! ASSEMBLE → CACHE WRITE
//!
//! Any failure after the cache check collapses into a well-formed empty
//! response carrying the error text; callers never see a raised error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::consent::ConsentService;
use crate::error::ExtractionError;
use crate::models::{
    AccountBalance, AccountReport, AccountTransaction, Balance, Consent, ExtractionResponse,
    ExtractionSummary, ProviderAccount, ProviderBalance, ProviderTransaction, TransactionReport,
    FALLBACK_CURRENCY,
};
use crate::router::RouterService;
use crate::routes::{AccountsRoute, BalancesRoute, Route, RouteMethod, TransactionsRoute};
use crate::Result;

const EXTRACTION_CACHE_PREFIX: &str = "extraction";

/// Hard cap on the pagination loop, in case the provider keeps
/// reporting `has_next`
const MAX_PAGES: u32 = 100;

pub struct ExtractionService {
    consent_service: Arc<ConsentService>,
    router: Arc<RouterService>,
    cache: Arc<CacheStore>,
    base_url: String,
}

impl ExtractionService {
    pub fn new(
        consent_service: Arc<ConsentService>,
        router: Arc<RouterService>,
        cache: Arc<CacheStore>,
        base_url: &str,
    ) -> Self {
        Self {
            consent_service,
            router,
            cache,
            base_url: base_url.to_string(),
        }
    }

    /// Run one extraction for `user_document`. Always returns a
    /// well-formed response; failures surface through
    /// `summary.errors`.
    pub async fn extract_financial_data(
        &self,
        user_document: &str,
        dynamic_client_id: &str,
        dynamic_token: &str,
    ) -> ExtractionResponse {
        let started = Instant::now();
        let extraction_date = Utc::now();

        if let Some(cached) = self
            .cache
            .get_cached_data::<ExtractionResponse>(EXTRACTION_CACHE_PREFIX, user_document)
            .await
        {
            info!(user_document, "Returning cached financial data");
            return cached;
        }

        info!(user_document, "Starting financial data extraction");
        match self
            .run_pipeline(
                user_document,
                dynamic_client_id,
                dynamic_token,
                extraction_date,
                started,
            )
            .await
        {
            Ok(response) => {
                info!(user_document, "Financial data extraction completed successfully");
                self.cache
                    .cache_data(EXTRACTION_CACHE_PREFIX, user_document, &response)
                    .await;
                response
            }
            Err(e) => {
                error!(user_document, error = %e, "Financial data extraction failed");
                self.failure_response(user_document, extraction_date, started, &e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        user_document: &str,
        dynamic_client_id: &str,
        dynamic_token: &str,
        extraction_date: DateTime<Utc>,
        started: Instant,
    ) -> Result<ExtractionResponse> {
        let consent = self
            .obtain_consent(user_document, dynamic_client_id, dynamic_token)
            .await?;
        info!(consent_id = %consent.id, "Consent obtained");

        let accounts = self.extract_accounts(user_document, &consent).await?;
        info!(count = accounts.len(), "Accounts extracted");

        let balances = self
            .extract_balances(user_document, &consent, &accounts)
            .await?;
        info!(count = balances.len(), "Balances extracted");

        let transactions = self
            .extract_transactions(user_document, &consent, &accounts)
            .await?;
        info!(count = transactions.len(), "Transactions extracted");

        Ok(self.build_response(
            user_document,
            extraction_date,
            accounts,
            balances,
            transactions,
            started.elapsed().as_millis() as u64,
            Vec::new(),
        ))
    }

    async fn obtain_consent(
        &self,
        user_document: &str,
        dynamic_client_id: &str,
        token: &str,
    ) -> Result<Consent> {
        self.consent_service
            .get_or_create_consent(user_document, dynamic_client_id, token)
            .await
            .map_err(|e| match e {
                consent @ ExtractionError::Consent(_) => consent,
                other => ExtractionError::Consent(other.to_string()),
            })
    }

    /// Accumulate items page by page. Unsuccessful results and transport
    /// errors are logged and the loop moves to the next page; a body
    /// without `items_key` counts as a single item and ends the loop.
    async fn fetch_paginated<F>(&self, make_route: F, items_key: &str) -> Vec<Value>
    where
        F: Fn(u32) -> Box<dyn Route>,
    {
        let mut items = Vec::new();
        let mut page: u32 = 1;
        let mut has_next = true;

        while has_next {
            let route = make_route(page);
            match self.router.process(route.as_ref()).await {
                Ok(result) if !result.success => {
                    warn!(page, status = result.status, "Paginated fetch returned unsuccessful result");
                }
                Ok(result) => {
                    let page_items = result.body.get(items_key).and_then(Value::as_array).cloned();
                    match page_items {
                        Some(page_items) => {
                            has_next = result
                                .body
                                .get("has_next")
                                .and_then(Value::as_bool)
                                .unwrap_or(false);
                            debug!(page, count = page_items.len(), has_next, "Fetched page");
                            items.extend(page_items);
                        }
                        None => {
                            items.push(result.body);
                            has_next = false;
                            debug!(page, "Fetched single item response");
                        }
                    }
                }
                Err(e) => {
                    warn!(page, error = %e, "Error fetching page");
                }
            }

            page += 1;
            if page > MAX_PAGES {
                warn!(max_pages = MAX_PAGES, "Reached maximum page limit");
                break;
            }
        }

        info!(total = items.len(), pages = page - 1, "Paginated fetch finished");
        items
    }

    async fn extract_accounts(
        &self,
        user_document: &str,
        consent: &Consent,
    ) -> Result<Vec<ProviderAccount>> {
        let base_url = self.base_url.clone();
        let token = consent.token.clone();
        let raw = self
            .fetch_paginated(
                move |page| {
                    Box::new(AccountsRoute::new(
                        &base_url,
                        &token,
                        RouteMethod::Get,
                        None,
                        Some(page),
                    )) as Box<dyn Route>
                },
                "items",
            )
            .await;

        // An empty result set is indistinguishable from a provider
        // error and treated as one
        if raw.is_empty() {
            error!(user_document, "Error extracting accounts");
            return Err(ExtractionError::Accounts(
                "accounts extraction failed".to_string(),
            ));
        }

        raw.into_iter()
            .map(|item| {
                serde_json::from_value::<ProviderAccount>(item).map_err(|e| {
                    ExtractionError::Accounts(format!("malformed account payload: {}", e))
                })
            })
            .collect()
    }

    async fn extract_balances(
        &self,
        user_document: &str,
        consent: &Consent,
        accounts: &[ProviderAccount],
    ) -> Result<Vec<AccountBalance>> {
        let mut balances = Vec::with_capacity(accounts.len());

        for account in accounts {
            let route = BalancesRoute::new(
                &self.base_url,
                &consent.token,
                RouteMethod::Get,
                &account.id,
            );
            let result = self
                .router
                .process(&route)
                .await
                .map_err(|e| ExtractionError::Balances(e.to_string()))?;

            if !result.success {
                error!(user_document, account_id = %account.id, "Error extracting balances");
                return Err(ExtractionError::Balances(
                    "balances extraction failed".to_string(),
                ));
            }

            let provider: ProviderBalance = serde_json::from_value(result.body).map_err(|e| {
                ExtractionError::Balances(format!("malformed balance payload: {}", e))
            })?;
            balances.push(AccountBalance {
                account_id: account.id.clone(),
                balance: Balance {
                    amount: provider.balance,
                    currency: provider.currency,
                },
            });
        }

        Ok(balances)
    }

    async fn extract_transactions(
        &self,
        user_document: &str,
        consent: &Consent,
        accounts: &[ProviderAccount],
    ) -> Result<Vec<AccountTransaction>> {
        let mut all_transactions = Vec::new();

        for account in accounts {
            let base_url = self.base_url.clone();
            let token = consent.token.clone();
            let account_id = account.id.clone();
            let raw = self
                .fetch_paginated(
                    move |page| {
                        Box::new(TransactionsRoute::new(
                            &base_url,
                            &token,
                            RouteMethod::Get,
                            &account_id,
                            page,
                        )) as Box<dyn Route>
                    },
                    "items",
                )
                .await;

            if raw.is_empty() {
                error!(user_document, account_id = %account.id, "Error extracting transactions");
                return Err(ExtractionError::Transactions(
                    "transactions extraction failed".to_string(),
                ));
            }

            let count = raw.len();
            for item in raw {
                let transaction: ProviderTransaction =
                    serde_json::from_value(item).map_err(|e| {
                        ExtractionError::Transactions(format!(
                            "malformed transaction payload: {}",
                            e
                        ))
                    })?;
                all_transactions.push(AccountTransaction {
                    account_id: account.id.clone(),
                    transaction,
                });
            }

            info!(account_id = %account.id, count, "Extracted transactions for account");
        }

        Ok(all_transactions)
    }

    /// Join balances and transactions back onto accounts by account id.
    /// Types, statuses and directions are upper-cased; a transaction's
    /// currency comes from its account's balance, defaulting to
    /// `FALLBACK_CURRENCY` when no balance is known.
    #[allow(clippy::too_many_arguments)]
    fn build_response(
        &self,
        user_document: &str,
        extraction_date: DateTime<Utc>,
        accounts: Vec<ProviderAccount>,
        balances: Vec<AccountBalance>,
        transactions: Vec<AccountTransaction>,
        processing_time_ms: u64,
        errors: Vec<String>,
    ) -> ExtractionResponse {
        let balance_lookup: HashMap<String, Balance> = balances
            .into_iter()
            .map(|entry| (entry.account_id, entry.balance))
            .collect();

        let mut transactions_by_account: HashMap<String, Vec<TransactionReport>> = HashMap::new();
        for entry in transactions {
            let currency = balance_lookup
                .get(&entry.account_id)
                .map(|balance| balance.currency.clone())
                .unwrap_or_else(|| FALLBACK_CURRENCY.to_string());
            let transaction = entry.transaction;
            transactions_by_account
                .entry(entry.account_id)
                .or_default()
                .push(TransactionReport {
                    transaction_id: transaction.id,
                    transaction_type: transaction.transaction_type.to_uppercase(),
                    transaction_status: transaction.transaction_status.to_uppercase(),
                    amount: transaction.transaction_amount,
                    currency,
                    direction: transaction.transaction_direction.to_uppercase(),
                    description: transaction.transaction_description,
                    date: parse_transaction_date(&transaction.transaction_date),
                });
        }

        let total_transactions: usize = transactions_by_account.values().map(Vec::len).sum();

        let account_reports: Vec<AccountReport> = accounts
            .into_iter()
            .map(|account| {
                let balance = balance_lookup.get(&account.id).cloned().unwrap_or(Balance {
                    amount: 0.0,
                    currency: FALLBACK_CURRENCY.to_string(),
                });
                let account_transactions = transactions_by_account
                    .remove(&account.id)
                    .unwrap_or_default();
                AccountReport {
                    account_id: account.id,
                    account_type: account.account_type.to_uppercase(),
                    account_status: account.account_status.to_uppercase(),
                    balance,
                    transactions: account_transactions,
                }
            })
            .collect();

        ExtractionResponse {
            user_document: user_document.to_string(),
            extraction_date,
            summary: ExtractionSummary {
                total_accounts: account_reports.len(),
                total_transactions,
                processing_time_ms,
                errors,
            },
            accounts: account_reports,
        }
    }

    /// The only failure mode callers see: a valid response with empty
    /// accounts and the error text in the summary.
    fn failure_response(
        &self,
        user_document: &str,
        extraction_date: DateTime<Utc>,
        started: Instant,
        error: &ExtractionError,
    ) -> ExtractionResponse {
        ExtractionResponse {
            user_document: user_document.to_string(),
            extraction_date,
            accounts: Vec::new(),
            summary: ExtractionSummary {
                total_accounts: 0,
                total_transactions: 0,
                processing_time_ms: started.elapsed().as_millis() as u64,
                errors: vec![format!("Financial data extraction failed: {}", error)],
            },
        }
    }
}

fn parse_transaction_date(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

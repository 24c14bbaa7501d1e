use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// Stored plan state for one account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    pub user_id: String,
    pub plan_status: String,
    pub valid_until: String,
}

/// Computed access level, derived from a Profile and wall-clock time.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub status: String,
    pub days_remaining: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub business_type: Option<String>,
    pub track_stock: bool,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateWalletPayload {
    pub name: String,
    pub business_type: Option<String>,
    #[serde(default)]
    pub track_stock: bool,
}

#[derive(Serialize)]
pub struct DeleteWalletResponse {
    pub remaining_wallets: u32,
    /// True when the deleted wallet was the user's last one and the session
    /// was flushed as a consequence.
    pub logged_out: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub wallet_id: String,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub direction: String,
    pub category: String,
    pub transaction_date: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateTransactionPayload {
    pub wallet_id: String,
    pub description: String,
    pub amount: Decimal,
    pub direction: String,
    pub category: Option<String>,
    pub transaction_date: String,
}

#[derive(Deserialize)]
pub struct UpdateTransactionPayload {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub direction: Option<String>,
    pub category: Option<String>,
    pub transaction_date: Option<String>,
}

#[derive(Deserialize)]
pub struct GetTransactionsQuery {
    pub wallet_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetTransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub kind: String,
    pub scope: String,
}

#[derive(Deserialize)]
pub struct CreateCategoryPayload {
    pub name: String,
    pub color: String,
    pub kind: String,
    pub scope: String,
}

#[derive(Deserialize)]
pub struct UpdateCategoryPayload {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct GetCategoriesQuery {
    pub scope: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetCategoriesResponse {
    pub categories: Vec<Category>,
    pub total_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Bill {
    pub id: String,
    pub wallet_id: String,
    pub user_id: String,
    pub description: String,
    pub amount: Decimal,
    pub kind: String,
    pub due_date: String,
    pub status: String,
    pub category: String,
}

/// A bill plus its derived display status (OVERDUE / DUE_TODAY / PENDING).
#[derive(Serialize)]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub display_status: String,
}

#[derive(Deserialize)]
pub struct CreateBillPayload {
    pub wallet_id: String,
    pub description: String,
    pub amount: Decimal,
    pub kind: String,
    pub due_date: String,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBillPayload {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<String>,
    pub due_date: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct GetBillsQuery {
    pub wallet_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize)]
pub struct GetBillsResponse {
    pub receivables: Vec<BillView>,
    pub payables: Vec<BillView>,
    pub total_receivable: Decimal,
    pub total_payable: Decimal,
    pub overdue_receivable: Decimal,
    pub overdue_payable: Decimal,
}

#[derive(Serialize)]
pub struct SettleBillResponse {
    pub bill_id: String,
    pub status: String,
    pub transaction: Transaction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Reserve {
    pub id: String,
    pub wallet_id: String,
    pub user_id: String,
    pub name: String,
    pub goal_amount: Decimal,
    pub current_amount: Decimal,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateReservePayload {
    pub wallet_id: String,
    pub name: String,
    pub goal_amount: Option<Decimal>,
    pub initial_amount: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct MoveReservePayload {
    pub amount: Decimal,
}

#[derive(Deserialize)]
pub struct DeleteReserveQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Deserialize)]
pub struct AdjustBalancePayload {
    pub observed_balance: Decimal,
}

#[derive(Serialize)]
pub struct AdjustBalanceResponse {
    pub balance: Decimal,
    /// The synthetic adjustment transaction, absent when the observed balance
    /// already matched the ledger.
    pub adjustment: Option<Transaction>,
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub balance: Decimal,
    pub period_income: Decimal,
    pub period_expense: Decimal,
    pub reserves_total: Decimal,
    pub transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
pub struct PaySalaryPayload {
    pub amount: Decimal,
}

#[derive(Serialize)]
pub struct PaySalaryResponse {
    pub personal_transaction: Transaction,
    pub business_transaction: Transaction,
}

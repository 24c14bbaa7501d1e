// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_DATA_PATH: &str = "data";

// Session configuration
pub const SESSION_NAME: &str = "carteira_session";
pub const SESSION_EXPIRY_DAYS: i64 = 30;
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

// Database limits and defaults
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 500;
pub const DEFAULT_BILLS_LIMIT: u32 = 200;
pub const DEFAULT_CATEGORIES_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;

// Validation limits
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_WALLET_NAME_LENGTH: usize = 100;
pub const MAX_RESERVE_NAME_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Wallet kinds
pub const WALLET_PERSONAL: &str = "PERSONAL";
pub const WALLET_BUSINESS: &str = "BUSINESS";

// Transaction directions
pub const DIRECTION_INCOME: &str = "INCOME";
pub const DIRECTION_EXPENSE: &str = "EXPENSE";

// Bill kinds and status FSM (PENDING -> PAID, terminal)
pub const BILL_PAYABLE: &str = "PAYABLE";
pub const BILL_RECEIVABLE: &str = "RECEIVABLE";
pub const BILL_STATUS_PENDING: &str = "PENDING";
pub const BILL_STATUS_PAID: &str = "PAID";

// Derived bill display status, never persisted
pub const BILL_DISPLAY_OVERDUE: &str = "OVERDUE";
pub const BILL_DISPLAY_DUE_TODAY: &str = "DUE_TODAY";
pub const BILL_DISPLAY_PENDING: &str = "PENDING";

// Plan status values stored on profiles
pub const PLAN_TRIAL: &str = "TRIAL";
pub const PLAN_ACTIVE: &str = "ACTIVE";
pub const PLAN_VIP: &str = "VIP";
pub const PLAN_EXPIRED: &str = "EXPIRED";
pub const PLAN_WAITING_PAYMENT: &str = "WAITING_PAYMENT";
pub const TRIAL_DAYS: i64 = 3;
pub const VIP_DAYS_REMAINING: i64 = 999;

// Categories written by consistency operations
pub const CATEGORY_ADJUSTMENT: &str = "Ajuste";
pub const CATEGORY_INVESTMENT: &str = "Investimento";
pub const CATEGORY_SALARY: &str = "Salário";
pub const CATEGORY_PRO_LABORE: &str = "Pró-labore";

// Classifier fallbacks
pub const FALLBACK_CATEGORY_TRANSACTION: &str = "Outros";
pub const FALLBACK_CATEGORY_BILL: &str = "Contas";

// Default wallet created at signup
pub const DEFAULT_PERSONAL_WALLET_NAME: &str = "Minha Carteira";

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_INVALID_SESSION: &str = "Invalid session";
pub const ERR_UNAUTHORIZED: &str = "Not logged in";

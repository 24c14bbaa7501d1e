use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    user_id     TEXT PRIMARY KEY,
    plan_status TEXT NOT NULL,
    valid_until TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id            TEXT    PRIMARY KEY,
    user_id       TEXT    NOT NULL,
    name          TEXT    NOT NULL,
    kind          TEXT    NOT NULL,
    business_type TEXT,
    track_stock   BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TEXT    NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id               TEXT PRIMARY KEY,
    wallet_id        TEXT NOT NULL,
    user_id          TEXT NOT NULL,
    description      TEXT NOT NULL,
    amount           TEXT NOT NULL,
    direction        TEXT NOT NULL,
    category         TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    created_at       TEXT NOT NULL
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id      TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name    TEXT NOT NULL,
    color   TEXT NOT NULL,
    kind    TEXT NOT NULL,
    scope   TEXT NOT NULL
);
"#;

const CREATE_BILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bills (
    id          TEXT PRIMARY KEY,
    wallet_id   TEXT NOT NULL,
    user_id     TEXT NOT NULL,
    description TEXT NOT NULL,
    amount      TEXT NOT NULL,
    kind        TEXT NOT NULL,
    due_date    TEXT NOT NULL,
    status      TEXT NOT NULL,
    category    TEXT NOT NULL
);
"#;

const CREATE_RESERVES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reserves (
    id             TEXT PRIMARY KEY,
    wallet_id      TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    name           TEXT NOT NULL,
    goal_amount    TEXT NOT NULL,
    current_amount TEXT NOT NULL,
    created_at     TEXT NOT NULL
);
"#;

const CREATE_TRANSACTIONS_WALLET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_wallet ON transactions(wallet_id);
"#;

const CREATE_TRANSACTIONS_DATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
"#;

const CREATE_BILLS_WALLET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_bills_wallet_status ON bills(wallet_id, status, due_date);
"#;

const CREATE_RESERVES_WALLET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_reserves_wallet ON reserves(wallet_id);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens the application database and bootstraps every logical table.
///
/// All rows carry their owning user_id; every query is scoped by it, which is
/// this layer's stand-in for the original backend's row-level security.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("carteira.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_PROFILES_TABLE, ()).await?;
    conn.execute(CREATE_WALLETS_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_BILLS_TABLE, ()).await?;
    conn.execute(CREATE_RESERVES_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_WALLET_INDEX, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_DATE_INDEX, ()).await?;
    conn.execute(CREATE_BILLS_WALLET_INDEX, ()).await?;
    conn.execute(CREATE_RESERVES_WALLET_INDEX, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}

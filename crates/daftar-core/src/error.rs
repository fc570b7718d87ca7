use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Book not found: {0}")]
    BookNotFound(String),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Period not found: {0}")]
    PeriodNotFound(Uuid),
    #[error("Code `{0}` is already in use")]
    DuplicateCode(String),
    #[error("Insufficient funds in {currency} cashbox: balance {balance}, requested {requested}")]
    InsufficientFunds {
        currency: String,
        balance: Decimal,
        requested: Decimal,
    },
    #[error("Period {0} is closed")]
    PeriodClosed(Uuid),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

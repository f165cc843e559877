use thiserror::Error;

/// Validation and contract errors exposed by `polywallet-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid venue '{value}', expected one of bybit, okx, binance, alpaca")]
    InvalidVenue { value: String },
    #[error("invalid order side '{value}', expected buy or sell")]
    InvalidSide { value: String },

    #[error("ticker scope symbol list must not be empty")]
    EmptySymbolList,
    #[error("order history limit must be greater than zero")]
    ZeroOrderLimit,
    #[error("order quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("limit orders require a positive limit price")]
    InvalidLimitPrice,

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp out of range: {millis} ms since epoch")]
    TimestampOutOfRange { millis: i64 },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

use thiserror::Error;

/// Failure of a single upstream candle source.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response could not be decoded: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} does not list symbol '{symbol}'")]
    UnknownSymbol {
        provider: &'static str,
        symbol: String,
    },

    #[error("request signing failed: {0}")]
    Auth(String),
}

/// Why a signal could not be (re)classified.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// No candles from any provider for the window. The signal stays open.
    #[error("no market data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("signal {signal_id} is malformed: {reason}")]
    MalformedSignal { signal_id: String, reason: String },

    /// The ledger says this signal may not be validated again.
    #[error("signal {signal_id} cannot be validated: {reason}")]
    PolicyViolation { signal_id: String, reason: String },

    #[error("ledger error: {0}")]
    Ledger(String),
}

impl ValidationError {
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, ValidationError::PolicyViolation { .. })
    }

    /// Errors that leave the signal open for a later pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ValidationError::DataUnavailable { .. })
    }
}

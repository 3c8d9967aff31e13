use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::models::{Outcome, ValidationKind};

/// One validation decision. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub signal_id: String,
    pub validated_at: DateTime<Utc>,
    #[serde(default)]
    pub previous_result: Option<Outcome>,
    pub new_result: Outcome,
    pub kind: ValidationKind,
    #[serde(default)]
    pub hit_levels: Vec<u32>,
    #[serde(default)]
    pub extreme_price: Option<f64>,
    #[serde(default)]
    pub profit_pct: Option<f64>,
}

/// Append-only store of validation decisions.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn append(&self, record: ValidationRecord) -> Result<(), ValidationError>;

    /// Every record for `signal_id`, in append order.
    async fn query_by_signal_id(&self, signal_id: &str)
        -> Result<Vec<ValidationRecord>, ValidationError>;
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<ValidationRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<ValidationRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn append(&self, record: ValidationRecord) -> Result<(), ValidationError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn query_by_signal_id(
        &self,
        signal_id: &str,
    ) -> Result<Vec<ValidationRecord>, ValidationError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.signal_id == signal_id)
            .cloned()
            .collect())
    }
}

/// Ledger persisted as JSON lines. Existing lines are loaded on open; each
/// append writes exactly one new line and never rewrites the file.
pub struct JsonlLedger {
    path: PathBuf,
    memory: InMemoryLedger,
    writer: Mutex<()>,
}

impl JsonlLedger {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ValidationError::Ledger(e.to_string()))?;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(ValidationError::Ledger(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        // Undecodable lines are fatal.
        let mut records = Vec::new();
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<ValidationRecord>(line).map_err(|e| {
                ValidationError::Ledger(format!("{}:{}: {}", path.display(), n + 1, e))
            })?;
            records.push(record);
        }
        info!("Ledger {} opened with {} records", path.display(), records.len());

        Ok(Self {
            path,
            memory: InMemoryLedger {
                records: RwLock::new(records),
            },
            writer: Mutex::new(()),
        })
    }
}

#[async_trait]
impl Ledger for JsonlLedger {
    async fn append(&self, record: ValidationRecord) -> Result<(), ValidationError> {
        let line =
            serde_json::to_string(&record).map_err(|e| ValidationError::Ledger(e.to_string()))?;

        let _guard = self.writer.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ValidationError::Ledger(e.to_string()))?;
        writeln!(file, "{}", line).map_err(|e| ValidationError::Ledger(e.to_string()))?;
        debug!("ledger += {} {}", record.signal_id, record.new_result);

        self.memory.append(record).await
    }

    async fn query_by_signal_id(
        &self,
        signal_id: &str,
    ) -> Result<Vec<ValidationRecord>, ValidationError> {
        self.memory.query_by_signal_id(signal_id).await
    }
}

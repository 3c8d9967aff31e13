use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::TradingSignal;
use crate::validation::report::BatchSummary;
use crate::validation::validator::SignalValidator;

/// Result of one orchestrator pass: every input signal, in input order.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub signals: Vec<TradingSignal>,
    pub summary: BatchSummary,
}

/// Validates many signals in fixed-size batches.
///
/// Signals inside a batch run concurrently; batches run one after another with
/// a fixed pause in between, which is the only upstream rate limiting.
pub struct BatchValidator {
    validator: Arc<SignalValidator>,
    batch_size: usize,
    delay: Duration,
}

impl BatchValidator {
    pub fn new(cfg: &Config, validator: Arc<SignalValidator>) -> Self {
        Self {
            validator,
            batch_size: cfg.batch_size.max(1),
            delay: cfg.batch_delay(),
        }
    }

    pub fn with_batching(mut self, batch_size: usize, delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.delay = delay;
        self
    }

    pub async fn run(&self, signals: Vec<TradingSignal>) -> BatchRun {
        let mut summary = BatchSummary::new(signals.len());
        let mut out = signals;

        // Permission is settled before any batch starts. A repeated id is
        // validated once and its copies mirror the first occurrence.
        let mut todo: Vec<usize> = Vec::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut copies: Vec<(usize, usize)> = Vec::new();
        for (idx, signal) in out.iter_mut().enumerate() {
            if let Some(&first) = first_seen.get(&signal.id) {
                warn!("{}: duplicate id at position {}, validated once", signal.id, idx);
                copies.push((idx, first));
                summary.skipped += 1;
                continue;
            }
            first_seen.insert(signal.id.clone(), idx);

            match self.validator.is_finalized(&signal.id).await {
                Ok(true) => summary.skipped += 1,
                Ok(false) => todo.push(idx),
                Err(e) => {
                    warn!("{}: ledger lookup failed: {}", signal.id, e);
                    signal.error = Some(e.to_string());
                    summary.record_error();
                }
            }
        }

        let batches: Vec<&[usize]> = todo.chunks(self.batch_size).collect();
        info!(
            "Validating {} of {} signals in {} batches of up to {}",
            todo.len(),
            out.len(),
            batches.len(),
            self.batch_size
        );

        for (n, batch) in batches.iter().enumerate() {
            if n > 0 {
                tokio::time::sleep(self.delay).await;
                summary.delays += 1;
            }
            summary.batch_sizes.push(batch.len());

            let results = join_all(
                batch
                    .iter()
                    .map(|&idx| self.validator.validate(&out[idx])),
            )
            .await;

            for (&idx, result) in batch.iter().zip(results) {
                match result {
                    Ok(updated) => {
                        if let Some(outcome) = updated.result {
                            summary.record_outcome(outcome, updated.profit_pct);
                        }
                        out[idx] = updated;
                    }
                    Err(e) => {
                        warn!("{} ({}): {}", out[idx].id, out[idx].symbol, e);
                        out[idx].error = Some(e.to_string());
                        summary.record_error();
                    }
                }
            }
            info!("Batch {}/{} done ({} signals)", n + 1, batches.len(), batch.len());
        }

        for (idx, first) in copies {
            out[idx] = out[first].clone();
        }

        summary.finish();
        BatchRun {
            signals: out,
            summary,
        }
    }
}

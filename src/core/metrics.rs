//! Customer metrics recalculation, fired after a job completes.

use crate::core::allotment::PriceTierResolver;
use crate::db::jobs::completed_jobs_for_customer;
use crate::db::pool::DbPool;
use crate::db::reference::{get_customer, load_tiers, update_customer_metrics};
use crate::db::settings::{default_allotted_minutes, pay_rate};
use crate::errors::AppResult;
use crate::models::time_entry::TimeEntry;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Downstream collaborator notified with the customer of a completed job.
pub trait MetricsRecalculator: Send + Sync {
    fn recalculate(&self, customer_id: i64) -> AppResult<()>;
}

/// Fire-and-forget dispatcher: runs the recalculator on its own thread and
/// only logs the outcome.
#[derive(Clone)]
pub struct MetricsTrigger {
    inner: Arc<dyn MetricsRecalculator>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl MetricsTrigger {
    pub fn new(inner: Arc<dyn MetricsRecalculator>) -> Self {
        Self {
            inner,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopRecalculator))
    }

    pub fn fire(&self, customer_id: i64) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("metrics-{customer_id}"))
            .spawn(move || match inner.recalculate(customer_id) {
                Ok(()) => tracing::debug!(customer_id, "customer metrics recalculated"),
                Err(e) => tracing::error!(customer_id, error = %e, "customer metrics recalculation failed"),
            });

        match spawned {
            Ok(handle) => {
                let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
                pending.retain(|h| !h.is_finished());
                pending.push(handle);
            }
            Err(e) => {
                tracing::error!(customer_id, error = %e, "could not start metrics recalculation");
            }
        }
    }

    /// Block until every recalculation started so far has finished.
    /// A short-lived process calls this before exiting.
    pub fn wait_idle(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
            pending.drain(..).collect()
        };
        for h in handles {
            if h.join().is_err() {
                tracing::error!("metrics recalculation thread panicked");
            }
        }
    }
}

/// Recalculator that does nothing; used where no downstream is wired.
pub struct NoopRecalculator;

impl MetricsRecalculator for NoopRecalculator {
    fn recalculate(&self, _customer_id: i64) -> AppResult<()> {
        Ok(())
    }
}

/// Averages efficiency and wage ratio over the customer's completed jobs and
/// stores them on the customer row. Friends & Family customers are skipped.
pub struct CustomerMetricsRecalculator {
    db_path: String,
    busy_timeout: Duration,
}

impl CustomerMetricsRecalculator {
    pub fn new(db_path: impl Into<String>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobFigures {
    pub efficiency: i64,
    pub wage_ratio: i64,
}

/// Efficiency and wage ratio of one completed job, or `None` when it has no
/// measurable duration.
pub fn job_figures(entries: &[TimeEntry], expected_minutes: i64, price: i64, pay_rate: f64) -> Option<JobFigures> {
    let first_in = entries.iter().map(|e| e.clock_in_time).min()?;
    let last_out = entries.iter().filter_map(|e| e.clock_out_time).max()?;
    let actual_hours = (last_out - first_in).num_seconds() as f64 / 3600.0;
    if actual_hours <= 0.0 {
        return None;
    }

    let wages: f64 = entries
        .iter()
        .filter(|e| !e.is_open())
        .map(|e| e.worked().num_seconds() as f64 / 3600.0 * pay_rate)
        .sum();

    let expected_hours = expected_minutes as f64 / 60.0;
    let efficiency = ((expected_hours / actual_hours) * 100.0).round().max(0.0) as i64;
    let wage_ratio = if price > 0 {
        (wages / price as f64 * 100.0).round() as i64
    } else {
        0
    };

    Some(JobFigures {
        efficiency,
        wage_ratio,
    })
}

impl MetricsRecalculator for CustomerMetricsRecalculator {
    fn recalculate(&self, customer_id: i64) -> AppResult<()> {
        let pool = DbPool::with_busy_timeout(&self.db_path, self.busy_timeout)?;
        let conn = &pool.conn;

        let Some(customer) = get_customer(conn, customer_id)? else {
            tracing::warn!(customer_id, "metrics requested for unknown customer");
            return Ok(());
        };
        if customer.is_friends_family {
            tracing::debug!(customer_id, "friends & family customer, metrics skipped");
            return Ok(());
        }

        let resolver = PriceTierResolver::new(load_tiers(conn)?);
        let fallback = default_allotted_minutes(conn)?;
        let expected = resolver
            .resolve(customer.price)
            .map(|t| t.allotted_minutes)
            .unwrap_or(fallback);
        let rate = pay_rate(conn)?;

        let figures: Vec<JobFigures> = completed_jobs_for_customer(conn, customer_id)?
            .iter()
            .filter_map(|(_, entries)| job_figures(entries, expected, customer.price, rate))
            .collect();

        if figures.is_empty() {
            update_customer_metrics(conn, customer_id, None, None)?;
            return Ok(());
        }

        let n = figures.len() as f64;
        let avg_eff = figures.iter().map(|f| f.efficiency as f64).sum::<f64>() / n;
        let avg_wage = figures.iter().map(|f| f.wage_ratio as f64).sum::<f64>() / n;

        update_customer_metrics(
            conn,
            customer_id,
            Some(avg_eff.round() as i64),
            Some(avg_wage.round() as i64),
        )?;
        tracing::info!(
            customer_id,
            jobs = figures.len(),
            efficiency = avg_eff.round() as i64,
            wage_ratio = avg_wage.round() as i64,
            "customer metrics updated"
        );
        Ok(())
    }
}

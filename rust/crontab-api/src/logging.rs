//! Startup logging helpers.
//!
//! [`OpTimer`] measures a startup phase (connecting the coordination store,
//! opening the log store) and the macros below keep the numbered init steps
//! and banners uniform.

use std::time::Instant;

/// Times a single operation and logs its outcome.
///
/// ```rust,ignore
/// use crontab_api::logging::OpTimer;
///
/// let timer = OpTimer::new("coordination", "connect");
/// let result = RedisCoordinator::connect(url, timeout, ttl).await;
/// timer.finish_with_result(result.as_ref());
/// ```
#[derive(Debug)]
pub struct OpTimer {
    component: &'static str,
    operation: &'static str,
    start: Instant,
}

impl OpTimer {
    /// Start timing `operation` on `component`.
    #[must_use]
    pub fn new(component: &'static str, operation: &'static str) -> Self {
        tracing::debug!(component, operation, "Operation started");
        Self {
            component,
            operation,
            start: Instant::now(),
        }
    }

    /// Log completion with the elapsed time.
    pub fn finish(self) {
        tracing::info!(
            component = self.component,
            operation = self.operation,
            duration_ms = self.start.elapsed().as_millis(),
            "Operation completed"
        );
    }

    /// Log success or failure of `result` with the elapsed time.
    pub fn finish_with_result<T, E: std::fmt::Display>(self, result: Result<&T, &E>) {
        let duration_ms = self.start.elapsed().as_millis();
        match result {
            Ok(_) => tracing::info!(
                component = self.component,
                operation = self.operation,
                duration_ms,
                "Operation completed successfully"
            ),
            Err(e) => tracing::error!(
                component = self.component,
                operation = self.operation,
                duration_ms,
                error = %e,
                "Operation failed"
            ),
        }
    }
}

/// Log a numbered initialization step, e.g. `[1/3] Coordination store - redis`.
#[macro_export]
macro_rules! log_init_step {
    ($step:expr, $total:expr, $name:expr, $detail:expr) => {
        tracing::info!(
            step = $step,
            total = $total,
            "[{}/{}] {} - {}",
            $step,
            $total,
            $name,
            $detail
        );
    };
    ($step:expr, $total:expr, $name:expr) => {
        tracing::info!(step = $step, total = $total, "[{}/{}] {}", $step, $total, $name);
    };
}

/// Log a non-fatal startup warning.
#[macro_export]
macro_rules! log_init_warning {
    ($msg:expr) => {
        tracing::warn!("⚠️  {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        tracing::warn!("⚠️  {}", format!($msg, $($arg)*));
    };
}

/// Log the successful end of a startup phase.
#[macro_export]
macro_rules! log_success {
    ($msg:expr) => {
        tracing::info!("✅ {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        tracing::info!("✅ {}", format!($msg, $($arg)*));
    };
}

/// Log a framed startup banner.
#[macro_export]
macro_rules! log_banner {
    ($title:expr) => {
        tracing::info!("═══════════════════════════════════════════════════");
        tracing::info!("  {}", $title);
        tracing::info!("═══════════════════════════════════════════════════");
    };
    ($title:expr, $subtitle:expr) => {
        tracing::info!("═══════════════════════════════════════════════════");
        tracing::info!("  {}", $title);
        tracing::info!("  {}", $subtitle);
        tracing::info!("═══════════════════════════════════════════════════");
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_timer_records_names() {
        let timer = OpTimer::new("log_store", "open");
        assert_eq!(timer.component, "log_store");
        assert_eq!(timer.operation, "open");
        timer.finish();
    }

    #[test]
    fn test_op_timer_finish_with_result() {
        let ok: Result<u8, String> = Ok(1);
        OpTimer::new("coordination", "connect").finish_with_result(ok.as_ref());

        let err: Result<u8, String> = Err("connection refused".to_string());
        OpTimer::new("coordination", "connect").finish_with_result(err.as_ref());
    }

    #[test]
    fn test_macros_expand() {
        crate::log_init_step!(1, 2, "Coordination store", "memory");
        crate::log_init_step!(2, 2, "Log store");
        crate::log_init_warning!("state of the {} backend is lost on restart", "memory");
        crate::log_success!("Crontab API ready");
        crate::log_banner!("Crontab API", "v0.1.0");
    }
}

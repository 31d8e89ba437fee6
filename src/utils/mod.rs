use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer that logs how long a stage took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Placeholder for a missing value.
pub const MISSING: &str = "—";

/// Fixed-precision number, or `—` when there is none.
pub fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{:.*}", decimals, x),
        None => MISSING.to_string(),
    }
}

/// Market cap with a T/B/M suffix.
pub fn fmt_market_cap(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else {
        format!("{:.0}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(12.346), 2), "12.35");
        assert_eq!(fmt_opt(Some(3.0), 0), "3");
        assert_eq!(fmt_opt(None, 2), "—");
    }

    #[test]
    fn test_fmt_market_cap() {
        assert_eq!(fmt_market_cap(2.2e11), "220.00B");
        assert_eq!(fmt_market_cap(1.5e12), "1.50T");
        assert_eq!(fmt_market_cap(980_000_000.0), "980.00M");
        assert_eq!(fmt_market_cap(42_000.0), "42000");
    }
}

use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Samples from a Prometheus text exposition, keyed by series
/// (`name` or `name{label="value"}`).
#[derive(Debug, Default)]
pub struct MetricsSnapshot {
    pub samples: HashMap<String, f64>,
}

impl MetricsSnapshot {
    pub fn value(&self, series: &str) -> Option<f64> {
        self.samples.get(series).copied()
    }

    /// Sum over every label set of `name`.
    pub fn total(&self, name: &str) -> f64 {
        self.samples
            .iter()
            .filter(|(series, _)| {
                series.as_str() == name || series.starts_with(&format!("{name}{{"))
            })
            .map(|(_, v)| v)
            .sum()
    }
}

pub fn prom_parse(text: &str) -> Result<MetricsSnapshot> {
    let mut snapshot = MetricsSnapshot::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (series, value) = line
            .rsplit_once(' ')
            .ok_or_else(|| anyhow!("malformed sample line: {line}"))?;
        let value: f64 = value
            .parse()
            .map_err(|e| anyhow!("bad value in '{line}': {e}"))?;
        snapshot.samples.insert(series.to_string(), value);
    }

    Ok(snapshot)
}

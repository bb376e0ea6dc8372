//! In-memory gauge sink.
//!
//! Keeps the last value per gauge plus the ordered list of emissions. Backs
//! the CLI's dry-run output and is handy for embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::{SinkError, StatsSink};

/// A single gauge emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSample {
    pub name: String,
    pub value: f64,
}

/// Thread-safe last-value gauge store.
pub struct GaugeStore {
    gauges: RwLock<HashMap<String, AtomicU64>>, // f64 bits stored as u64
    samples: Mutex<Vec<GaugeSample>>,
}

impl GaugeStore {
    pub fn new() -> Self {
        Self {
            gauges: RwLock::new(HashMap::new()),
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Set a gauge to the given value.
    pub fn set_gauge(&self, name: &str, value: f64) {
        self.samples.lock().push(GaugeSample {
            name: name.to_string(),
            value,
        });

        let gauges = self.gauges.read();
        if let Some(gauge) = gauges.get(name) {
            gauge.store(f64::to_bits(value), Ordering::Relaxed);
            return;
        }
        drop(gauges);

        self.gauges
            .write()
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(f64::to_bits(value), Ordering::Relaxed);
    }

    /// Last value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.gauges
            .read()
            .get(name)
            .map(|v| f64::from_bits(v.load(Ordering::Relaxed)))
    }

    /// Every emission, oldest first.
    pub fn samples(&self) -> Vec<GaugeSample> {
        self.samples.lock().clone()
    }

    /// Last values keyed by name.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), f64::from_bits(v.load(Ordering::Relaxed))))
            .collect()
    }

    pub fn clear(&self) {
        self.gauges.write().clear();
        self.samples.lock().clear();
    }
}

impl Default for GaugeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSink for GaugeStore {
    fn gauge(&self, name: &str, value: f64) -> Result<(), SinkError> {
        self.set_gauge(name, value);
        Ok(())
    }
}

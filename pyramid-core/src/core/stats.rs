//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Statistics collector

use stats::{MinMax, OnlineStats};
use std::collections::BTreeMap;
use std::fmt;

type MeasurementType = u64;

struct StatCollector {
    online: OnlineStats,
    minmax: MinMax<MeasurementType>,
}

pub struct StatResults {
    pub len: usize,
    pub min: MeasurementType,
    pub max: MeasurementType,
    pub mean: f64,
    pub stddev: f64,
}

/// Measurements grouped by key, reported in key order
pub struct Statistics(BTreeMap<String, StatCollector>);

impl Statistics {
    pub fn new() -> Statistics {
        Statistics(BTreeMap::new())
    }
    pub fn add(&mut self, key: String, value: MeasurementType) {
        let collector = self.0.entry(key).or_insert(StatCollector {
            online: OnlineStats::new(),
            minmax: MinMax::new(),
        });
        collector.online.add(value);
        collector.minmax.add(value);
    }
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
    /// Return the current results.
    pub fn results(&self, key: &str) -> StatResults {
        match self.0.get(key) {
            Some(collector) => StatResults {
                len: collector.minmax.len(),
                min: *collector.minmax.min().unwrap_or(&0),
                max: *collector.minmax.max().unwrap_or(&0),
                mean: collector.online.mean(),
                stddev: collector.online.stddev(),
            },
            None => StatResults {
                len: 0,
                min: 0,
                max: 0,
                mean: 0.0,
                stddev: 0.0,
            },
        }
    }
}

impl fmt::Display for StatResults {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "n={} min={} max={} mean={:.1} +/- {:.1}",
            self.len, self.min, self.max, self.mean, self.stddev
        )
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for key in self.0.keys() {
            writeln!(f, "{}: {}", key, self.results(key))?;
        }
        Ok(())
    }
}

#[test]
fn usage() {
    let mut stats = Statistics::new();
    stats.add("render_ms.13".to_string(), 1);
    assert_eq!(stats.results("render_ms.13").mean, 1.0);
    stats.add("render_ms.13".to_string(), 2);
    assert_eq!(stats.results("render_ms.13").mean, 1.5);
    stats.add("tile_bytes.13".to_string(), 2);
    assert_eq!(stats.results("tile_bytes.13").mean, 2.0);
    stats.add("render_ms.13".to_string(), 3);
    assert_eq!(stats.results("render_ms.13").mean, 2.0);
    assert_eq!(stats.results("render_ms.13").stddev, 0.816496580927726);
    assert_eq!(stats.results("render_ms.13").len, 3);
    assert_eq!(stats.results("render_ms.13").min, 1);
    assert_eq!(stats.results("render_ms.13").max, 3);

    assert_eq!(stats.results("render_ms.14").mean, 0.0);
    assert_eq!(
        stats.keys().cloned().collect::<Vec<_>>(),
        vec!["render_ms.13".to_string(), "tile_bytes.13".to_string()]
    );
    assert_eq!(
        format!("{}", stats),
        "render_ms.13: n=3 min=1 max=3 mean=2.0 +/- 0.8\ntile_bytes.13: n=1 min=2 max=2 mean=2.0 +/- 0.0\n"
    );
}

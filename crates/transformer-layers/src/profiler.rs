// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stage instrumentation hooks.
//!
//! The pipeline brackets each stage with paired
//! [`start_stage`](StageProfiler::start_stage) /
//! [`end_stage`](StageProfiler::end_stage) calls. Profilers observe
//! timing only; they must never alter numerical results or control
//! flow, and the default [`NoopProfiler`] compiles down to nothing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tensor_core::Device;

/// Observer for pipeline stage boundaries.
///
/// Implementations must be safe to share across concurrent pipeline
/// invocations; accumulation state needs a lock or atomic discipline.
pub trait StageProfiler: Send + Sync {
    /// Called immediately before a stage runs.
    fn start_stage(&self, name: &str, device: Device);

    /// Called immediately after a stage completes.
    fn end_stage(&self, name: &str, device: Device);
}

/// The default profiler: both hooks are no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProfiler;

impl StageProfiler for NoopProfiler {
    fn start_stage(&self, _name: &str, _device: Device) {}
    fn end_stage(&self, _name: &str, _device: Device) {}
}

/// A completed stage measurement.
#[derive(Debug, Clone)]
pub struct StageRecord {
    /// Stage name (e.g. `"ffn/gemm0"`).
    pub name: String,
    /// Device the stage ran on.
    pub device: Device,
    /// Wall-clock duration between the start/end brackets.
    pub duration: Duration,
}

/// Accumulates per-stage wall-clock durations.
///
/// Start marks and finished records live behind a `Mutex`, so one
/// profiler may be shared across concurrent invocations; unmatched
/// `end_stage` calls are ignored.
#[derive(Debug, Default)]
pub struct RecordingProfiler {
    open: Mutex<HashMap<String, Instant>>,
    records: Mutex<Vec<StageRecord>>,
}

impl RecordingProfiler {
    /// Creates an empty profiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all completed stage records.
    pub fn records(&self) -> Vec<StageRecord> {
        self.records
            .lock()
            .expect("profiler records mutex poisoned")
            .clone()
    }

    /// Returns the total recorded duration for stages with `name`.
    pub fn total(&self, name: &str) -> Duration {
        self.records
            .lock()
            .expect("profiler records mutex poisoned")
            .iter()
            .filter(|r| r.name == name)
            .map(|r| r.duration)
            .sum()
    }

    /// Renders a one-line summary of all recorded stages.
    pub fn summary(&self) -> String {
        let records = self.records();
        if records.is_empty() {
            return "no stages recorded".to_string();
        }
        let parts: Vec<String> = records
            .iter()
            .map(|r| {
                format!(
                    "{} {:.3}ms [{}]",
                    r.name,
                    r.duration.as_secs_f64() * 1000.0,
                    r.device,
                )
            })
            .collect();
        parts.join(", ")
    }
}

impl StageProfiler for RecordingProfiler {
    fn start_stage(&self, name: &str, _device: Device) {
        self.open
            .lock()
            .expect("profiler open mutex poisoned")
            .insert(name.to_string(), Instant::now());
    }

    fn end_stage(&self, name: &str, device: Device) {
        let started = self
            .open
            .lock()
            .expect("profiler open mutex poisoned")
            .remove(name);
        if let Some(t0) = started {
            self.records
                .lock()
                .expect("profiler records mutex poisoned")
                .push(StageRecord {
                    name: name.to_string(),
                    device,
                    duration: t0.elapsed(),
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_is_safe() {
        let p = NoopProfiler;
        p.start_stage("x", Device::cpu());
        p.end_stage("x", Device::cpu());
    }

    #[test]
    fn test_recording_pairs() {
        let p = RecordingProfiler::new();
        p.start_stage("ffn/Copy", Device::cpu());
        p.end_stage("ffn/Copy", Device::cpu());

        let records = p.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ffn/Copy");
        assert_eq!(records[0].device, Device::cpu());
    }

    #[test]
    fn test_unmatched_end_ignored() {
        let p = RecordingProfiler::new();
        p.end_stage("never-started", Device::cpu());
        assert!(p.records().is_empty());
    }

    #[test]
    fn test_nested_stages() {
        let p = RecordingProfiler::new();
        p.start_stage("outer", Device::cpu());
        p.start_stage("inner", Device::cpu());
        p.end_stage("inner", Device::cpu());
        p.end_stage("outer", Device::cpu());

        let records = p.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "inner");
        assert_eq!(records[1].name, "outer");
        assert!(records[1].duration >= records[0].duration);
    }

    #[test]
    fn test_summary_contains_stage_names() {
        let p = RecordingProfiler::new();
        p.start_stage("ffn/gemm0", Device::cpu());
        p.end_stage("ffn/gemm0", Device::cpu());

        let s = p.summary();
        assert!(s.contains("ffn/gemm0"));
        assert!(s.contains("cpu"));
    }
}

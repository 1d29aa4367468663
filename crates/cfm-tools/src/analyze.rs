// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Log Analyzer
// ─────────────────────────────────────────────────────────────────────
//! Statistics and anomaly counts over recorded run files.
//!
//! Input is any JSON document shaped like a run record. Trajectories
//! other than the four common metrics are reported separately as
//! core-specific series. JSON cannot carry NaN, so `null` entries in a
//! series are counted as NaN.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use cfm_types::COMMON_METRICS;

/// Summary statistics of one series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub nan_count: usize,
    pub inf_count: usize,
    pub below_zero: usize,
    pub above_one: usize,
}

/// Mean, population standard deviation, min and max of the finite values.
pub(crate) fn finite_summary(values: &[f64]) -> Option<(f64, f64, f64, f64)> {
    let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return None;
    }
    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = if valid.len() > 1 {
        valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
    } else {
        0.0
    };
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((mean, variance.sqrt(), min, max))
}

pub fn compute_stats(values: &[f64]) -> MetricStats {
    let mut stats = MetricStats {
        count: values.len(),
        ..Default::default()
    };
    for &v in values {
        if v.is_nan() {
            stats.nan_count += 1;
        } else if v.is_infinite() {
            stats.inf_count += 1;
        } else if v < 0.0 {
            stats.below_zero += 1;
        } else if v > 1.0 {
            stats.above_one += 1;
        }
    }
    if let Some((mean, std, min, max)) = finite_summary(values) {
        stats.mean = Some(mean);
        stats.std = Some(std);
        stats.min = Some(min);
        stats.max = Some(max);
    }
    stats
}

/// Numeric view of a JSON series. `null` becomes NaN; other non-numbers
/// are skipped.
pub(crate) fn numeric_series(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Null => Some(f64::NAN),
                    other => other.as_f64(),
                })
                .collect()
        })
        .unwrap_or_default()
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub core_type: String,
    pub scenario: String,
    pub num_steps: u64,
    pub dt: f64,
    pub seed: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisValidation {
    pub total_nan: usize,
    pub total_inf: usize,
    pub total_below_zero: usize,
    pub total_above_one: usize,
    pub all_bounded: bool,
    /// The run's own `validation` block, if any.
    pub source_validation: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunAnalysis {
    pub metadata: AnalysisMetadata,
    pub common_metrics: BTreeMap<String, MetricStats>,
    pub core_specific_metrics: BTreeMap<String, MetricStats>,
    pub final_state: Value,
    pub validation: AnalysisValidation,
    pub analysis_timestamp: String,
}

fn str_field(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Analyze one parsed run document.
pub fn analyze_run(run: &Value) -> RunAnalysis {
    let empty = Value::Object(Default::default());
    let metadata = run.get("metadata").unwrap_or(&empty);
    let trajectories = run.get("trajectories").and_then(Value::as_object);

    let mut common_metrics = BTreeMap::new();
    let mut core_specific_metrics = BTreeMap::new();
    if let Some(series) = trajectories {
        for (key, values) in series {
            let stats = compute_stats(&numeric_series(values));
            if COMMON_METRICS.contains(&key.as_str()) {
                common_metrics.insert(key.clone(), stats);
            } else {
                core_specific_metrics.insert(key.clone(), stats);
            }
        }
    }

    let total = |f: fn(&MetricStats) -> usize| common_metrics.values().map(f).sum::<usize>();
    let total_nan = total(|s| s.nan_count);
    let total_inf = total(|s| s.inf_count);
    let total_below_zero = total(|s| s.below_zero);
    let total_above_one = total(|s| s.above_one);

    RunAnalysis {
        metadata: AnalysisMetadata {
            core_type: str_field(metadata, "core_type", "unknown"),
            scenario: str_field(metadata, "scenario", "unknown"),
            num_steps: metadata.get("num_steps").and_then(Value::as_u64).unwrap_or(0),
            dt: metadata.get("dt").and_then(Value::as_f64).unwrap_or(0.0),
            seed: metadata.get("seed").and_then(Value::as_u64).unwrap_or(0),
            timestamp: str_field(metadata, "timestamp", ""),
        },
        common_metrics,
        core_specific_metrics,
        final_state: run.get("final_state").cloned().unwrap_or_else(|| empty.clone()),
        validation: AnalysisValidation {
            total_nan,
            total_inf,
            total_below_zero,
            total_above_one,
            all_bounded: total_nan + total_inf + total_below_zero + total_above_one == 0,
            source_validation: run.get("validation").cloned().unwrap_or(empty),
        },
        analysis_timestamp: crate::timestamp(),
    }
}

// ── Formatting ───────────────────────────────────────────────────────

fn stats_table<'a>(
    out: &mut String,
    rows: impl Iterator<Item = (&'a str, Option<&'a MetricStats>)>,
) {
    let _ = writeln!(out, "{:<12} {:>10} {:>10} {:>10} {:>10}", "Metric", "Mean", "Std", "Min", "Max");
    let _ = writeln!(out, "{}", "-".repeat(54));
    for (name, stats) in rows {
        match stats.and_then(|s| Some((s.mean?, s.std?, s.min?, s.max?))) {
            Some((mean, std, min, max)) => {
                let _ = writeln!(out, "{name:<12} {mean:>10.6} {std:>10.6} {min:>10.6} {max:>10.6}");
            }
            None => {
                let _ = writeln!(out, "{name:<12} {:>10} {:>10} {:>10} {:>10}", "N/A", "N/A", "N/A", "N/A");
            }
        }
    }
    out.push('\n');
}

/// Human-readable report for one analysis.
pub fn format_text_report(analysis: &RunAnalysis, filename: &str) -> String {
    let rule = "=".repeat(60);
    let thin = "-".repeat(40);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}\nCFM LOG ANALYSIS REPORT\n{rule}");
    if !filename.is_empty() {
        let _ = writeln!(out, "File: {filename}");
    }
    let _ = writeln!(out, "Analysis time: {}\n", analysis.analysis_timestamp);

    let m = &analysis.metadata;
    let _ = writeln!(out, "METADATA\n{thin}");
    let _ = writeln!(out, "  Core type:    {}", m.core_type);
    let _ = writeln!(out, "  Scenario:     {}", m.scenario);
    let _ = writeln!(out, "  Steps:        {}", m.num_steps);
    let _ = writeln!(out, "  dt:           {}", m.dt);
    let _ = writeln!(out, "  Seed:         {}", m.seed);
    let _ = writeln!(out, "  Timestamp:    {}\n", m.timestamp);

    let _ = writeln!(out, "COMMON METRICS (coherence, stability, intensity, alignment)\n{thin}");
    stats_table(
        &mut out,
        COMMON_METRICS
            .iter()
            .filter(|k| analysis.common_metrics.contains_key(**k))
            .map(|k| (*k, analysis.common_metrics.get(*k))),
    );

    if !analysis.core_specific_metrics.is_empty() {
        let _ = writeln!(out, "CORE-SPECIFIC METRICS\n{thin}");
        stats_table(
            &mut out,
            analysis
                .core_specific_metrics
                .iter()
                .map(|(k, s)| (k.as_str(), Some(s))),
        );
    }

    if let Some(state) = analysis.final_state.as_object().filter(|o| !o.is_empty()) {
        let _ = writeln!(out, "FINAL STATE\n{thin}");
        for (key, value) in state {
            match value.as_f64() {
                Some(v) if value.is_f64() => {
                    let _ = writeln!(out, "  {key}: {v:.6}");
                }
                _ => {
                    let _ = writeln!(out, "  {key}: {value}");
                }
            }
        }
        out.push('\n');
    }

    let v = &analysis.validation;
    let _ = writeln!(out, "VALIDATION\n{thin}");
    let _ = writeln!(out, "  Bounded [0,1]: {}", if v.all_bounded { "PASS" } else { "FAIL" });
    let _ = writeln!(out, "  NaN values:    {}", v.total_nan);
    let _ = writeln!(out, "  Inf values:    {}", v.total_inf);
    let _ = writeln!(out, "  Below 0:       {}", v.total_below_zero);
    let _ = writeln!(out, "  Above 1:       {}\n", v.total_above_one);
    out.push_str(&rule);
    out
}

/// One-line-per-file summary across several analyses.
pub fn format_summary(analyses: &[(String, RunAnalysis)]) -> String {
    let rule = "=".repeat(70);
    let mut out = String::new();
    let _ = writeln!(out, "{rule}\nCFM MULTI-RUN SUMMARY\n{rule}");
    let _ = writeln!(out, "Total files analyzed: {}\n", analyses.len());
    let _ = writeln!(out, "{:<30} {:<8} {:>8} {:>8}", "File", "Core", "Steps", "Bounded");
    let _ = writeln!(out, "{}", "-".repeat(70));

    let mut passed = 0;
    for (filename, analysis) in analyses {
        let short: String = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.clone())
            .chars()
            .take(28)
            .collect();
        let core: String = analysis.metadata.core_type.chars().take(6).collect();
        let bounded = if analysis.validation.all_bounded {
            passed += 1;
            "PASS"
        } else {
            "FAIL"
        };
        let _ = writeln!(
            out,
            "{short:<30} {core:<8} {:>8} {bounded:>8}",
            analysis.metadata.num_steps
        );
    }
    let _ = writeln!(out, "\nPassed: {passed}/{}", analyses.len());
    out.push_str(&rule);
    out
}

// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Run Fingerprints
// ─────────────────────────────────────────────────────────────────────
//! Compact per-metric statistics of a run, and recursive comparison of
//! two fingerprints for regression checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cfm_types::COMMON_METRICS;

use crate::analyze::{finite_summary, numeric_series};

/// Absolute difference below which two numbers compare equal.
pub const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Relative difference above which a numeric difference is significant.
pub const SIGNIFICANT_REL_DIFF: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl SeriesStats {
    /// Statistics of the finite values; all zeros when there are none.
    pub fn from_values(values: &[f64]) -> Self {
        match finite_summary(values) {
            Some((mean, std, min, max)) => Self {
                mean,
                std,
                min,
                max,
                range: max - min,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub core_type: String,
    pub scenario: String,
    pub num_steps: u64,
    pub timestamp: String,
    pub source_timestamp: String,
    pub common_metrics: BTreeMap<String, SeriesStats>,
    /// Reserved for variant-specific series; the current cores only
    /// report the common metrics.
    #[serde(default)]
    pub core_specific: BTreeMap<String, SeriesStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Fingerprint a parsed run document. Missing series fingerprint as zeros.
pub fn extract_fingerprint(run: &Value) -> Fingerprint {
    let meta = |key: &str| run.get("metadata").and_then(|m| m.get(key));
    let text = |key: &str, default: &str| {
        meta(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    let common_metrics = COMMON_METRICS
        .iter()
        .map(|&key| {
            let values = run
                .get("trajectories")
                .and_then(|t| t.get(key))
                .map(numeric_series)
                .unwrap_or_default();
            (key.to_string(), SeriesStats::from_values(&values))
        })
        .collect();

    Fingerprint {
        core_type: text("core_type", "unknown"),
        scenario: text("scenario", "unknown"),
        num_steps: meta("num_steps").and_then(Value::as_u64).unwrap_or(0),
        timestamp: crate::timestamp(),
        source_timestamp: text("timestamp", ""),
        common_metrics,
        core_specific: BTreeMap::new(),
        source_file: None,
    }
}

// ── Comparison ───────────────────────────────────────────────────────

/// One difference found between two JSON trees, addressed by a dotted
/// path with `[i]` for array elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Difference {
    MissingInFirst {
        path: String,
        value2: Value,
    },
    MissingInSecond {
        path: String,
        value1: Value,
    },
    LengthMismatch {
        path: String,
        len1: usize,
        len2: usize,
    },
    NumericDifference {
        path: String,
        value1: f64,
        value2: f64,
        abs_diff: f64,
        rel_diff: f64,
    },
    ValueMismatch {
        path: String,
        value1: Value,
        value2: Value,
    },
}

impl Difference {
    pub fn path(&self) -> &str {
        match self {
            Self::MissingInFirst { path, .. }
            | Self::MissingInSecond { path, .. }
            | Self::LengthMismatch { path, .. }
            | Self::NumericDifference { path, .. }
            | Self::ValueMismatch { path, .. } => path,
        }
    }

    /// Structural differences always count; numeric ones only above
    /// [`SIGNIFICANT_REL_DIFF`].
    pub fn is_significant(&self) -> bool {
        match self {
            Self::NumericDifference { rel_diff, .. } => *rel_diff > SIGNIFICANT_REL_DIFF,
            _ => true,
        }
    }

    /// `first -> second` rendering used by the CLI.
    pub fn describe(&self) -> String {
        match self {
            Self::MissingInFirst { path, value2 } => format!("{path}: N/A -> {value2}"),
            Self::MissingInSecond { path, value1 } => format!("{path}: {value1} -> N/A"),
            Self::LengthMismatch { path, len1, len2 } => format!("{path}: length {len1} -> {len2}"),
            Self::NumericDifference {
                path,
                value1,
                value2,
                rel_diff,
                ..
            } => format!(
                "{path}: {value1} -> {value2} (relative diff: {:.2}%)",
                rel_diff * 100.0
            ),
            Self::ValueMismatch {
                path,
                value1,
                value2,
            } => format!("{path}: {value1} -> {value2}"),
        }
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Recursively diff two JSON values.
pub fn compare_values(a: &Value, b: &Value, path: &str) -> Vec<Difference> {
    let mut diffs = Vec::new();
    collect_differences(a, b, path, &mut diffs);
    diffs
}

fn collect_differences(a: &Value, b: &Value, path: &str, out: &mut Vec<Difference>) {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            let keys: std::collections::BTreeSet<&String> = ma.keys().chain(mb.keys()).collect();
            for key in keys {
                let p = child_path(path, key);
                match (ma.get(key), mb.get(key)) {
                    (None, Some(v2)) => out.push(Difference::MissingInFirst {
                        path: p,
                        value2: v2.clone(),
                    }),
                    (Some(v1), None) => out.push(Difference::MissingInSecond {
                        path: p,
                        value1: v1.clone(),
                    }),
                    (Some(v1), Some(v2)) => collect_differences(v1, v2, &p, out),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(la), Value::Array(lb)) => {
            if la.len() != lb.len() {
                out.push(Difference::LengthMismatch {
                    path: path.to_string(),
                    len1: la.len(),
                    len2: lb.len(),
                });
            } else {
                for (i, (v1, v2)) in la.iter().zip(lb).enumerate() {
                    collect_differences(v1, v2, &format!("{path}[{i}]"), out);
                }
            }
        }
        (Value::Number(na), Value::Number(nb)) => {
            let (x, y) = (na.as_f64().unwrap_or(0.0), nb.as_f64().unwrap_or(0.0));
            let abs_diff = (x - y).abs();
            if abs_diff > NUMERIC_TOLERANCE {
                out.push(Difference::NumericDifference {
                    path: path.to_string(),
                    value1: x,
                    value2: y,
                    abs_diff,
                    rel_diff: abs_diff / x.abs().max(y.abs()).max(1e-10),
                });
            }
        }
        _ if a != b => out.push(Difference::ValueMismatch {
            path: path.to_string(),
            value1: a.clone(),
            value2: b.clone(),
        }),
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintSummary {
    pub core_type: Option<String>,
    pub scenario: Option<String>,
    pub timestamp: Option<String>,
}

impl FingerprintSummary {
    fn of(fp: &Value) -> Self {
        let field = |k: &str| fp.get(k).and_then(Value::as_str).map(str::to_string);
        Self {
            core_type: field("core_type"),
            scenario: field("scenario"),
            timestamp: field("timestamp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintComparison {
    pub fingerprint1: FingerprintSummary,
    pub fingerprint2: FingerprintSummary,
    pub core_type_match: bool,
    pub scenario_match: bool,
    pub total_differences: usize,
    pub significant_differences: usize,
    pub all_differences: Vec<Difference>,
    pub significant_diff_details: Vec<Difference>,
}

/// Compare two fingerprint documents. Only the metric sections are
/// diffed; identity fields are reported as match flags.
pub fn compare_fingerprints(fp1: &Value, fp2: &Value) -> FingerprintComparison {
    let empty = Value::Object(Default::default());
    let section = |fp: &Value, key: &str| fp.get(key).cloned().unwrap_or_else(|| empty.clone());

    let mut all = compare_values(
        &section(fp1, "common_metrics"),
        &section(fp2, "common_metrics"),
        "common_metrics",
    );
    all.extend(compare_values(
        &section(fp1, "core_specific"),
        &section(fp2, "core_specific"),
        "core_specific",
    ));
    let significant: Vec<Difference> = all.iter().filter(|d| d.is_significant()).cloned().collect();

    FingerprintComparison {
        fingerprint1: FingerprintSummary::of(fp1),
        fingerprint2: FingerprintSummary::of(fp2),
        core_type_match: fp1.get("core_type") == fp2.get("core_type"),
        scenario_match: fp1.get("scenario") == fp2.get("scenario"),
        total_differences: all.len(),
        significant_differences: significant.len(),
        all_differences: all,
        significant_diff_details: significant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_series_stats() {
        let s = SeriesStats::from_values(&[0.2, 0.6, f64::NAN]);
        assert!((s.mean - 0.4).abs() < 1e-12);
        assert!((s.std - 0.2).abs() < 1e-12);
        assert!((s.range - 0.4).abs() < 1e-12);
        assert_eq!(SeriesStats::from_values(&[]), SeriesStats::default());
    }

    #[test]
    fn test_extract_fingerprint() {
        let run = json!({
            "metadata": {"core_type": "cfm_v1", "scenario": "baseline_quiet", "num_steps": 2, "timestamp": "t0"},
            "trajectories": {"coherence": [0.4, 0.6], "stability": [0.5, 0.5]}
        });
        let fp = extract_fingerprint(&run);
        assert_eq!(fp.core_type, "cfm_v1");
        assert_eq!(fp.source_timestamp, "t0");
        assert_eq!(fp.common_metrics.len(), 4);
        assert!((fp.common_metrics["coherence"].mean - 0.5).abs() < 1e-12);
        assert_eq!(fp.common_metrics["alignment"], SeriesStats::default());
        assert!(fp.core_specific.is_empty());
    }

    #[test]
    fn test_compare_identical_is_clean() {
        let fp = json!({"core_type": "cfm_v2", "common_metrics": {"coherence": {"mean": 0.5}}});
        let cmp = compare_fingerprints(&fp, &fp);
        assert!(cmp.core_type_match && cmp.scenario_match);
        assert_eq!(cmp.total_differences, 0);
    }

    #[test]
    fn test_tolerance_and_significance() {
        let a = json!({"common_metrics": {"c": {"mean": 0.5, "std": 0.1, "min": 0.2}}});
        let b = json!({"common_metrics": {"c": {"mean": 0.5000001, "std": 0.102, "min": 0.3}}});
        let cmp = compare_fingerprints(&a, &b);
        assert_eq!(cmp.total_differences, 2);
        assert_eq!(cmp.significant_differences, 1);
        assert_eq!(cmp.significant_diff_details[0].path(), "common_metrics.c.min");
    }

    #[test]
    fn test_structural_differences() {
        let a = json!({"x": [1, 2], "y": "v2", "only_a": 1});
        let b = json!({"x": [1, 2, 3], "y": "v3", "only_b": true});
        let diffs = compare_values(&a, &b, "");
        let kinds: Vec<&str> = diffs.iter().map(|d| d.path()).collect();
        assert_eq!(kinds, vec!["only_a", "only_b", "x", "y"]);
        assert!(matches!(diffs[0], Difference::MissingInSecond { .. }));
        assert!(matches!(diffs[1], Difference::MissingInFirst { .. }));
        assert!(matches!(diffs[2], Difference::LengthMismatch { len1: 2, len2: 3, .. }));
        assert!(matches!(diffs[3], Difference::ValueMismatch { .. }));
        assert!(diffs.iter().all(Difference::is_significant));
    }

    #[test]
    fn test_array_element_paths() {
        let diffs = compare_values(&json!([0.1, 0.2]), &json!([0.1, 0.9]), "series");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path(), "series[1]");
    }

    #[test]
    fn test_difference_serializes_with_type_tag() {
        let d = Difference::LengthMismatch {
            path: "p".into(),
            len1: 1,
            len2: 2,
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["type"], "length_mismatch");
        assert_eq!(v["len2"], 2);
    }

    #[test]
    fn test_fingerprints_of_identical_runs_match() {
        let run = crate::run_local_loop("cfm_v2", None, 300, 0.1, false).unwrap();
        let value = serde_json::to_value(&run).unwrap();
        let a = serde_json::to_value(extract_fingerprint(&value)).unwrap();
        let b = serde_json::to_value(extract_fingerprint(&value)).unwrap();
        assert_eq!(compare_fingerprints(&a, &b).total_differences, 0);
    }

    #[test]
    fn test_fingerprint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.json");
        let run = crate::run_local_loop("cfm_v1", None, 50, 0.1, false).unwrap();
        let mut fp = extract_fingerprint(&serde_json::to_value(&run).unwrap());
        fp.source_file = Some("run.json".into());
        crate::write_json(&path, &fp).unwrap();
        let back: Fingerprint = serde_json::from_value(crate::read_json(&path).unwrap()).unwrap();
        assert_eq!(back, fp);
    }
}

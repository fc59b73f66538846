//! Text exposition format encoder.
//!
//! Snapshots are validated up front and only then written, so a bad
//! snapshot (typically from an external collectable) yields an error and no
//! output at all.

use std::collections::HashSet;
use std::fmt::Write;

use bytes::{Bytes, BytesMut};

use crate::error::{MetricsError, Result};
use crate::labels::{is_valid_metric_name, LabelSet};
use crate::snapshot::{MetricFamily, MetricKind, MetricValue};

/// Content type of the encoded body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape a label value (`\`, `"`, newline).
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape HELP text (`\`, newline).
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest round-trip form; integral values print without a fraction.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }
    let s = format!("{v:?}");
    match s.strip_suffix(".0") {
        Some(int) => int.to_string(),
        None => s,
    }
}

/// Encode families into one body.
///
/// Family names must be unique across the whole slice: a body with two
/// blocks for one name is rejected by conforming parsers.
pub fn encode(families: &[MetricFamily]) -> Result<Bytes> {
    let mut seen = HashSet::with_capacity(families.len());
    for f in families {
        validate_family(f)?;
        if !seen.insert(f.name.as_str()) {
            return Err(MetricsError::Serialization(format!(
                "family {} appears more than once",
                f.name
            )));
        }
    }
    let mut out = BytesMut::with_capacity(families.len() * 256);
    for f in families {
        write_family(&mut out, f)
            .map_err(|e| MetricsError::Serialization(format!("write {}: {e}", f.name)))?;
    }
    Ok(out.freeze())
}

fn validate_family(f: &MetricFamily) -> Result<()> {
    if !is_valid_metric_name(&f.name) {
        return Err(MetricsError::Serialization(format!(
            "invalid family name {:?}",
            f.name
        )));
    }
    let reserved = match f.kind {
        MetricKind::Histogram => Some("le"),
        MetricKind::Summary => Some("quantile"),
        _ => None,
    };
    for m in &f.metrics {
        if m.value.kind() != f.kind {
            return Err(MetricsError::Serialization(format!(
                "family {} is a {} but holds a {} series",
                f.name,
                f.kind.as_str(),
                m.value.kind().as_str()
            )));
        }
        if let Some(r) = reserved {
            if m.labels.contains(r) {
                return Err(MetricsError::Serialization(format!(
                    "family {} series uses reserved label {r:?}",
                    f.name
                )));
            }
        }
        match &m.value {
            MetricValue::Histogram(h) => {
                let Some(last) = h.buckets.last() else {
                    return Err(MetricsError::Serialization(format!(
                        "histogram {} has no buckets",
                        f.name
                    )));
                };
                if last.upper_bound != f64::INFINITY || last.cumulative_count != h.count {
                    return Err(MetricsError::Serialization(format!(
                        "histogram {} +Inf bucket does not match count",
                        f.name
                    )));
                }
                for w in h.buckets.windows(2) {
                    if !(w[0].upper_bound < w[1].upper_bound)
                        || w[0].cumulative_count > w[1].cumulative_count
                    {
                        return Err(MetricsError::Serialization(format!(
                            "histogram {} buckets are not cumulative",
                            f.name
                        )));
                    }
                }
            }
            MetricValue::Summary(s) => {
                if s.quantiles.iter().any(|q| !(0.0..=1.0).contains(&q.quantile)) {
                    return Err(MetricsError::Serialization(format!(
                        "summary {} has a quantile outside [0, 1]",
                        f.name
                    )));
                }
            }
            MetricValue::Counter(_) | MetricValue::Gauge(_) => {}
        }
    }
    Ok(())
}

fn write_family(out: &mut BytesMut, f: &MetricFamily) -> std::fmt::Result {
    if !f.help.is_empty() {
        writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help))?;
    }
    writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str())?;

    for m in &f.metrics {
        match &m.value {
            MetricValue::Counter(v) | MetricValue::Gauge(v) => {
                write_sample(out, &f.name, "", &m.labels, None, &format_float(*v))?;
            }
            MetricValue::Histogram(h) => {
                for b in &h.buckets {
                    write_sample(
                        out,
                        &f.name,
                        "_bucket",
                        &m.labels,
                        Some(("le", &format_float(b.upper_bound))),
                        &b.cumulative_count.to_string(),
                    )?;
                }
                write_sample(out, &f.name, "_sum", &m.labels, None, &format_float(h.sum))?;
                write_sample(out, &f.name, "_count", &m.labels, None, &h.count.to_string())?;
            }
            MetricValue::Summary(s) => {
                for q in &s.quantiles {
                    write_sample(
                        out,
                        &f.name,
                        "",
                        &m.labels,
                        Some(("quantile", &format_float(q.quantile))),
                        &format_float(q.value),
                    )?;
                }
                write_sample(out, &f.name, "_sum", &m.labels, None, &format_float(s.sum))?;
                write_sample(out, &f.name, "_count", &m.labels, None, &s.count.to_string())?;
            }
        }
    }
    Ok(())
}

fn write_sample(
    out: &mut BytesMut,
    name: &str,
    suffix: &str,
    labels: &LabelSet,
    extra: Option<(&str, &str)>,
    value: &str,
) -> std::fmt::Result {
    out.write_str(name)?;
    out.write_str(suffix)?;
    if !labels.is_empty() || extra.is_some() {
        out.write_char('{')?;
        let mut first = true;
        for (k, v) in labels.iter().chain(extra) {
            if !first {
                out.write_char(',')?;
            }
            first = false;
            write!(out, "{k}=\"{}\"", escape_label(v))?;
        }
        out.write_char('}')?;
    }
    writeln!(out, " {value}")
}

//! Text encoder: exact output, escaping, validation, and parse-back.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;

use promkit_core::snapshot::{Bucket, ClientMetric, HistogramSnapshot};
use promkit_core::text::{encode, format_float, CONTENT_TYPE};
use promkit_core::{
    Buckets, ErrorClass, FamilyOpts, LabelSet, MetricFamily, MetricKind, MetricValue, Quantile,
    Registry, SummaryConfig,
};

type Sample = (String, BTreeMap<String, String>, f64);

/// Minimal parser for the text format: returns (name, labels, value) per
/// sample line and checks HELP/TYPE lines precede their samples.
fn parse(body: &str) -> Vec<Sample> {
    let mut out = Vec::new();
    let mut typed = Vec::new();
    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            typed.push(rest.split(' ').next().unwrap().to_string());
            continue;
        }
        if line.starts_with("# HELP ") || line.is_empty() {
            continue;
        }
        let (series, value) = line.rsplit_once(' ').expect("sample line");
        let value = match value {
            "+Inf" => f64::INFINITY,
            "-Inf" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            v => v.parse::<f64>().unwrap(),
        };
        let (name, labels) = match series.find('{') {
            None => (series.to_string(), BTreeMap::new()),
            Some(i) => {
                let inner = series[i + 1..].strip_suffix('}').expect("closing brace");
                (series[..i].to_string(), parse_labels(inner))
            }
        };
        assert!(
            typed.iter().any(|t| name.starts_with(t.as_str())),
            "sample {name} before its TYPE line"
        );
        out.push((name, labels, value));
    }
    out
}

fn parse_labels(mut s: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    while !s.is_empty() {
        let eq = s.find('=').unwrap();
        let key = s[..eq].to_string();
        s = &s[eq + 1..];
        assert!(s.starts_with('"'));
        let mut chars = s[1..].char_indices();
        let mut value = String::new();
        let end = loop {
            let (i, c) = chars.next().expect("unterminated label value");
            match c {
                '\\' => match chars.next().unwrap().1 {
                    'n' => value.push('\n'),
                    other => value.push(other),
                },
                '"' => break i + 1,
                c => value.push(c),
            }
        };
        map.insert(key, value);
        s = &s[end + 1..];
        s = s.strip_prefix(',').unwrap_or(s);
    }
    map
}

fn body(registry: &Registry) -> String {
    String::from_utf8(encode(&registry.gather()).unwrap().to_vec()).unwrap()
}

#[test]
fn content_type_is_text_v004() {
    assert_eq!(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8");
}

#[test]
fn counter_and_gauge_exact_output() {
    let registry = Registry::new();
    let packets = registry
        .add_counter(FamilyOpts::new("observed_packets_total", "Number of observed packets", ()))
        .unwrap();
    packets
        .add_pairs(&[("protocol", "tcp"), ("direction", "rx")])
        .unwrap()
        .increment(3.0)
        .unwrap();
    packets
        .add_pairs(&[("protocol", "udp"), ("direction", "tx")])
        .unwrap()
        .inc();
    registry
        .add_gauge(FamilyOpts::new("queue_depth", "", ()))
        .unwrap()
        .add(&LabelSet::new())
        .unwrap()
        .set(-1.25);

    let expected = "\
# HELP observed_packets_total Number of observed packets
# TYPE observed_packets_total counter
observed_packets_total{direction=\"rx\",protocol=\"tcp\"} 3
observed_packets_total{direction=\"tx\",protocol=\"udp\"} 1
# TYPE queue_depth gauge
queue_depth -1.25
";
    assert_eq!(body(&registry), expected);
}

#[test]
fn histogram_exact_output() {
    let registry = Registry::new();
    let h = registry
        .add_histogram(FamilyOpts::new(
            "name_histogram",
            "help histogram",
            Buckets::new(vec![0.5, 1.0]).unwrap(),
        ))
        .unwrap()
        .add_pairs(&[("path", "/x")])
        .unwrap();
    h.observe(0.25);
    h.observe(0.75);
    h.observe(7.0);

    let expected = "\
# HELP name_histogram help histogram
# TYPE name_histogram histogram
name_histogram_bucket{path=\"/x\",le=\"0.5\"} 1
name_histogram_bucket{path=\"/x\",le=\"1\"} 2
name_histogram_bucket{path=\"/x\",le=\"+Inf\"} 3
name_histogram_sum{path=\"/x\"} 8
name_histogram_count{path=\"/x\"} 3
";
    assert_eq!(body(&registry), expected);
}

#[test]
fn summary_output_shape() {
    let registry = Registry::new();
    let s = registry
        .add_summary(FamilyOpts::new(
            "rpc_seconds",
            "RPC latency",
            SummaryConfig::new(vec![
                Quantile { quantile: 0.5, error: 0.05 },
                Quantile { quantile: 0.9, error: 0.01 },
            ]),
        ))
        .unwrap()
        .add(&LabelSet::new())
        .unwrap();
    for v in [1.0, 2.0, 3.0] {
        s.observe(v);
    }

    let expected = "\
# HELP rpc_seconds RPC latency
# TYPE rpc_seconds summary
rpc_seconds{quantile=\"0.5\"} 2
rpc_seconds{quantile=\"0.9\"} 3
rpc_seconds_sum 6
rpc_seconds_count 3
";
    assert_eq!(body(&registry), expected);
}

#[test]
fn escaping_in_labels_and_help() {
    let registry = Registry::new();
    registry
        .add_counter(FamilyOpts::new("esc_total", "line one\nback\\slash", ()))
        .unwrap()
        .add_pairs(&[("v", "a\"b\\c\nd")])
        .unwrap()
        .inc();
    let text = body(&registry);
    assert!(text.contains("# HELP esc_total line one\\nback\\\\slash\n"));
    assert!(text.contains("esc_total{v=\"a\\\"b\\\\c\\nd\"} 1\n"));

    let parsed = parse(&text);
    assert_eq!(parsed[0].1.get("v").unwrap(), "a\"b\\c\nd");
}

fn with_label(labels: &LabelSet, name: &str, value: f64) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> =
        labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    out.insert(name.to_string(), format_float(value));
    out
}

/// Expand gathered snapshots into the (name, labels, value) lines they encode to.
fn expand(families: Vec<MetricFamily>) -> Vec<Sample> {
    let mut out: Vec<Sample> = Vec::new();
    for f in families {
        for m in f.metrics {
            let labels: BTreeMap<String, String> =
                m.labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            match m.value {
                MetricValue::Counter(v) | MetricValue::Gauge(v) => {
                    out.push((f.name.clone(), labels, v));
                }
                MetricValue::Histogram(h) => {
                    for b in &h.buckets {
                        out.push((
                            format!("{}_bucket", f.name),
                            with_label(&m.labels, "le", b.upper_bound),
                            b.cumulative_count as f64,
                        ));
                    }
                    out.push((format!("{}_sum", f.name), labels.clone(), h.sum));
                    out.push((format!("{}_count", f.name), labels, h.count as f64));
                }
                MetricValue::Summary(s) => {
                    for q in &s.quantiles {
                        out.push((
                            f.name.clone(),
                            with_label(&m.labels, "quantile", q.quantile),
                            q.value,
                        ));
                    }
                    out.push((format!("{}_sum", f.name), labels.clone(), s.sum));
                    out.push((format!("{}_count", f.name), labels, s.count as f64));
                }
            }
        }
    }
    out
}

#[test]
fn round_trip_reproduces_samples() {
    let registry = Registry::new();
    let http = registry
        .add_counter(FamilyOpts::new("http_requests_total", "Number of HTTP requests", ()))
        .unwrap();
    for (i, method) in ["GET", "PUT", "POST", "HEAD"].iter().enumerate() {
        http.add_pairs(&[("method", method)])
            .unwrap()
            .increment(i as f64 + 0.5)
            .unwrap();
    }
    let gauge = registry
        .add_gauge(FamilyOpts::new("gauge_requests_total", "Number of gauge requests", ()))
        .unwrap();
    gauge.add_pairs(&[("type", "gauge"), ("direction", "rx")]).unwrap().set(1e-7);
    gauge.add_pairs(&[("type", "gauge"), ("direction", "tx")]).unwrap().set(1.7e9);

    let latency = registry
        .add_histogram(FamilyOpts::new(
            "request_seconds",
            "Request latency",
            Buckets::new(vec![0.005, 0.25, 2.5]).unwrap(),
        ))
        .unwrap();
    let get = latency.add_pairs(&[("route", "/a")]).unwrap();
    for v in [0.001, 0.1, 0.2, 3.0, 42.0] {
        get.observe(v);
    }
    latency.add_pairs(&[("route", "/b")]).unwrap().observe(1.0);

    let sizes = registry
        .add_summary(FamilyOpts::new(
            "payload_bytes",
            "Payload size",
            SummaryConfig::new(vec![
                Quantile { quantile: 0.5, error: 0.05 },
                Quantile { quantile: 0.99, error: 0.001 },
            ]),
        ))
        .unwrap()
        .add_pairs(&[("kind", "json")])
        .unwrap();
    for v in [120.0, 80.0, 4096.0, 512.0] {
        sizes.observe(v);
    }

    let parsed = parse(&body(&registry));
    let expected = expand(registry.gather());

    assert!(expected.iter().any(|(name, labels, v)| name == "request_seconds_bucket"
        && labels.get("le").map(String::as_str) == Some("+Inf")
        && *v == 5.0));
    assert!(expected
        .iter()
        .any(|(name, labels, _)| name == "payload_bytes" && labels.contains_key("quantile")));
    assert_eq!(parsed, expected);
}

#[test]
fn duplicate_family_names_are_rejected() {
    let a = Registry::new();
    let b = Registry::new();
    for r in [&a, &b] {
        r.add_counter(FamilyOpts::new("x", "", ()))
            .unwrap()
            .add(&LabelSet::new())
            .unwrap()
            .inc();
    }
    let mut families = a.gather();
    families.extend(b.gather());

    let err = encode(&families).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Serialization);
    assert!(encode(&a.gather()).is_ok());
}

#[test]
fn invalid_snapshot_is_a_serialization_error() {
    let bad_name = MetricFamily {
        name: "bad name".into(),
        help: String::new(),
        kind: MetricKind::Counter,
        metrics: vec![],
    };
    let err = encode(&[bad_name]).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Serialization);

    let not_cumulative = MetricFamily {
        name: "h".into(),
        help: String::new(),
        kind: MetricKind::Histogram,
        metrics: vec![ClientMetric {
            labels: LabelSet::new(),
            value: MetricValue::Histogram(HistogramSnapshot {
                buckets: vec![
                    Bucket { upper_bound: 1.0, cumulative_count: 5 },
                    Bucket { upper_bound: f64::INFINITY, cumulative_count: 3 },
                ],
                sum: 1.0,
                count: 3,
            }),
        }],
    };
    assert!(encode(&[not_cumulative]).is_err());

    let mismatched = MetricFamily {
        name: "g".into(),
        help: String::new(),
        kind: MetricKind::Gauge,
        metrics: vec![ClientMetric {
            labels: LabelSet::new(),
            value: MetricValue::Counter(1.0),
        }],
    };
    assert!(encode(&[mismatched]).is_err());
}

#[test]
fn empty_family_emits_only_headers() {
    let registry = Registry::new();
    registry.add_counter(FamilyOpts::new("idle_total", "Idle", ())).unwrap();
    assert_eq!(body(&registry), "# HELP idle_total Idle\n# TYPE idle_total counter\n");
}

//! Metrics definitions for the groups API.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "groups.requests",
    metric_type: MetricType::Counter,
    description: "Number of requests received by the groups endpoint",
};

pub const LOOKUP_DURATION: MetricDef = MetricDef {
    name: "groups.lookup.duration",
    metric_type: MetricType::Histogram,
    description: "Time to resolve groups from the store and fallback in seconds",
};

pub const SERVED_FROM_STORE: MetricDef = MetricDef {
    name: "groups.source.store",
    metric_type: MetricType::Counter,
    description: "Number of lookups answered by the SQLite store",
};

pub const SERVED_FROM_FALLBACK: MetricDef = MetricDef {
    name: "groups.source.fallback",
    metric_type: MetricType::Counter,
    description: "Number of lookups answered by the fallback document",
};

pub const STORE_ERRORS: MetricDef = MetricDef {
    name: "groups.store.errors",
    metric_type: MetricType::Counter,
    description: "Number of lookups where the SQLite store failed",
};

pub const FALLBACK_ERRORS: MetricDef = MetricDef {
    name: "groups.fallback.errors",
    metric_type: MetricType::Counter,
    description: "Number of lookups where the fallback document could not be read",
};

// Every definition must be listed here to be described at startup.
pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS,
    LOOKUP_DURATION,
    SERVED_FROM_STORE,
    SERVED_FROM_FALLBACK,
    STORE_ERRORS,
    FALLBACK_ERRORS,
];

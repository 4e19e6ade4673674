//! Structured tracing for the lattice's public entry points.
//!
//! Events use target `trellis::query_json`; read them with
//! `TRELLIS_LOG=trellis::query_json=trace TRELLIS_LOG_FORMAT=json`.
//!
//! `TRELLIS_QUERY_RUN_ID` is attached to every event when set.

use crate::types::{TypeId, UntypedMode};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "trellis::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| std::env::var("TRELLIS_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string()))
        .as_str()
}

/// Start of a join or meet.
pub(crate) fn binary_start(query_id: u64, op: &'static str, left: TypeId, right: TypeId) {
    trace!(
        target: "trellis::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        left_type_id = left.0,
        right_type_id = right.0
    );
}

/// End of a join or meet. `result_type_id` is absent when the query failed.
pub(crate) fn binary_end(query_id: u64, op: &'static str, result: Option<TypeId>) {
    trace!(
        target: "trellis::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result_type_id = result.map(|id| id.0),
        failed = result.is_none()
    );
}

/// Start of a subtyping query.
pub(crate) fn relation_start(
    query_id: u64,
    op: &'static str,
    source: TypeId,
    target: TypeId,
    mode: UntypedMode,
) {
    trace!(
        target: "trellis::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        source_type_id = source.0,
        target_type_id = target.0,
        untyped_compatible = mode == UntypedMode::AlwaysCompatible
    );
}

pub(crate) fn relation_end(query_id: u64, op: &'static str, result: Option<bool>) {
    trace!(
        target: "trellis::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result,
        failed = result.is_none()
    );
}

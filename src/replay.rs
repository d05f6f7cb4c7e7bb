//! Replay recorded trace files through a subscriber slot
//!
//! A trace file is a JSON array of `TraceEvent` records, typically captured
//! from an engine session. Replay is the reference delivery path: it feeds
//! the events through a `SubscriberSlot` exactly as a live runtime hook
//! would, one at a time, synchronously.

use crate::event::TraceEvent;
use crate::session::SubscriberSlot;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Load a recorded event stream from a JSON file
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceEvent>> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        bail!("Trace file not found: {}", path_ref.display());
    }

    let contents = fs::read_to_string(path_ref).context("Failed to read trace file")?;

    let events: Vec<TraceEvent> =
        serde_json::from_str(&contents).context("Invalid trace JSON")?;

    Ok(events)
}

/// Deliver every event to the slot's subscriber, in order
pub fn replay(events: &[TraceEvent], slot: &SubscriberSlot) {
    for event in events {
        slot.emit(event);
    }
}

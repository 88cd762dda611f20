//! Timeline artifact generation from a recording.

use serde::ser::Serializer as _;
use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{Phase, Recording, StepKind, StepSortResult, highlight_index};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub index: usize,
    pub kind: StepKind,
    pub phase: Phase,
    pub description: String,
    #[serde(default)]
    pub highlight: Option<usize>,
}

pub fn timeline_entries(recording: &Recording) -> impl Iterator<Item = TimelineEntry> + '_ {
    recording.steps.iter().enumerate().map(|(index, step)| TimelineEntry {
        index,
        kind: step.kind(),
        phase: step.phase(),
        description: step.describe(recording.min),
        highlight: highlight_index(step, &recording.input),
    })
}

pub fn write_timeline(recording: &Recording, out_path: &Path) -> StepSortResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::with_capacity(recording.steps.len().saturating_mul(96));
    {
        let mut ser = serde_json::Serializer::new(&mut buf);
        use serde::ser::SerializeSeq as _;
        let mut seq = ser.serialize_seq(Some(recording.steps.len()))?;
        for entry in timeline_entries(recording) {
            seq.serialize_element(&entry)?;
        }
        seq.end()?;
    }
    std::fs::write(out_path, buf)?;
    Ok(())
}

//! Trace file format (.stepsort) read/write.

use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::{Recorder, Recording, StepRecord, StepSortError, StepSortResult};

pub const TRACE_FORMAT: &str = "stepsort-trace";
pub const CURRENT_TRACE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFile {
    pub format: String,
    pub version: u32,
    pub trace_id: uuid::Uuid,
    pub recorded_at: String,
    pub engine: VersionInfo,
    pub input: Vec<i64>,
    pub min: i64,
    pub max: i64,
    pub steps: Vec<StepRecord>,
    pub sorted: Vec<i64>,
    pub checksum: String,
}

impl TraceFile {
    pub fn new(recording: &Recording) -> StepSortResult<Self> {
        let recorded_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)?;
        Ok(Self {
            format: TRACE_FORMAT.to_string(),
            version: CURRENT_TRACE_VERSION,
            trace_id: uuid::Uuid::new_v4(),
            recorded_at,
            engine: version_info(),
            input: recording.input.clone(),
            min: recording.min,
            max: recording.max,
            steps: recording.steps.clone(),
            sorted: recording.sorted.clone(),
            checksum: recording.checksum()?,
        })
    }

    pub fn to_recording(&self) -> Recording {
        Recording {
            input: self.input.clone(),
            min: self.min,
            max: self.max,
            steps: self.steps.clone(),
            sorted: self.sorted.clone(),
        }
    }

    pub fn write_json(&self, path: &Path) -> StepSortResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> StepSortResult<Self> {
        let bytes = std::fs::read(path)?;
        let t: TraceFile = serde_json::from_slice(&bytes)?;
        if t.format != TRACE_FORMAT {
            return Err(StepSortError::Trace(format!(
                "{} is not a stepsort trace (format {:?})",
                path.display(),
                t.format
            )));
        }
        if t.version != CURRENT_TRACE_VERSION {
            return Err(StepSortError::Trace(format!(
                "unsupported trace version {} (expected {CURRENT_TRACE_VERSION})",
                t.version
            )));
        }
        Ok(t)
    }

    /// Re-records the stored input and checks that the stored steps,
    /// checksum and sorted output are what the recorder produces today.
    pub fn verify(&self, recorder: &Recorder) -> StepSortResult<()> {
        let stored = self.to_recording().checksum()?;
        if stored != self.checksum {
            return Err(StepSortError::Trace(format!(
                "checksum mismatch: file says {}, steps hash to {stored}",
                self.checksum
            )));
        }
        let fresh = recorder.record(&self.input)?;
        let fresh_sum = fresh.checksum()?;
        if fresh_sum != self.checksum {
            return Err(StepSortError::Trace(format!(
                "re-recording diverged: expected {}, got {fresh_sum}",
                self.checksum
            )));
        }
        if fresh.sorted != self.sorted {
            return Err(StepSortError::Trace("re-recording produced a different sorted output".to_string()));
        }
        Ok(())
    }
}

//! Typed step records emitted by the instrumented counting sort.

use serde::{Deserialize, Serialize};

/// One recorded micro-operation plus value copies of the working arrays at
/// the moment it happened.
///
/// Records are immutable once emitted: every snapshot is an owned copy, so
/// later mutation of the live `count`/`output` arrays never leaks into an
/// earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepRecord {
    /// One position of the bucket scan for `active_value`.
    CountingIteration {
        active_value: i64,
        scan_index: usize,
        is_target_index: bool,
        count_snapshot: Vec<usize>,
        source_index: usize,
    },
    /// The bucket counter for `active_value` was incremented.
    Counting {
        active_value: i64,
        target_index: usize,
        count_snapshot: Vec<usize>,
        source_index: usize,
    },
    /// Prefix-sum update `count[position] += count[position - 1]`.
    Cumulative {
        position: usize,
        previous_value: usize,
        new_value: usize,
        count_snapshot: Vec<usize>,
    },
    PositionLookup {
        value: i64,
        count_index: usize,
        count_snapshot: Vec<usize>,
        output_snapshot: Vec<Option<i64>>,
        #[serde(default)]
        source_index: Option<usize>,
    },
    /// `target_position = count_value - 1`.
    PositionCalculation {
        value: i64,
        count_index: usize,
        count_value: usize,
        target_position: usize,
        count_snapshot: Vec<usize>,
        output_snapshot: Vec<Option<i64>>,
        #[serde(default)]
        source_index: Option<usize>,
    },
    /// `value` was written to `target_position` and its bucket decremented.
    Sorting {
        value: i64,
        target_position: usize,
        count_index: usize,
        count_snapshot: Vec<usize>,
        output_snapshot: Vec<Option<i64>>,
        #[serde(default)]
        source_index: Option<usize>,
    },
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    CountingIteration,
    Counting,
    Cumulative,
    PositionLookup,
    PositionCalculation,
    Sorting,
    Completion,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::CountingIteration => "counting_iteration",
            StepKind::Counting => "counting",
            StepKind::Cumulative => "cumulative",
            StepKind::PositionLookup => "position_lookup",
            StepKind::PositionCalculation => "position_calculation",
            StepKind::Sorting => "sorting",
            StepKind::Completion => "completion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Counting,
    Cumulative,
    Placement,
    Done,
}

impl StepRecord {
    pub fn kind(&self) -> StepKind {
        match self {
            StepRecord::CountingIteration { .. } => StepKind::CountingIteration,
            StepRecord::Counting { .. } => StepKind::Counting,
            StepRecord::Cumulative { .. } => StepKind::Cumulative,
            StepRecord::PositionLookup { .. } => StepKind::PositionLookup,
            StepRecord::PositionCalculation { .. } => StepKind::PositionCalculation,
            StepRecord::Sorting { .. } => StepKind::Sorting,
            StepRecord::Completion => StepKind::Completion,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            StepRecord::CountingIteration { .. } | StepRecord::Counting { .. } => Phase::Counting,
            StepRecord::Cumulative { .. } => Phase::Cumulative,
            StepRecord::PositionLookup { .. }
            | StepRecord::PositionCalculation { .. }
            | StepRecord::Sorting { .. } => Phase::Placement,
            StepRecord::Completion => Phase::Done,
        }
    }

    /// The input value this record is about, if any.
    pub fn value(&self) -> Option<i64> {
        match self {
            StepRecord::CountingIteration { active_value, .. }
            | StepRecord::Counting { active_value, .. } => Some(*active_value),
            StepRecord::PositionLookup { value, .. }
            | StepRecord::PositionCalculation { value, .. }
            | StepRecord::Sorting { value, .. } => Some(*value),
            StepRecord::Cumulative { .. } | StepRecord::Completion => None,
        }
    }

    /// Position in the original, unsorted input the value came from.
    pub fn source_index(&self) -> Option<usize> {
        match self {
            StepRecord::CountingIteration { source_index, .. }
            | StepRecord::Counting { source_index, .. } => Some(*source_index),
            StepRecord::PositionLookup { source_index, .. }
            | StepRecord::PositionCalculation { source_index, .. }
            | StepRecord::Sorting { source_index, .. } => *source_index,
            StepRecord::Cumulative { .. } | StepRecord::Completion => None,
        }
    }

    pub fn count_snapshot(&self) -> Option<&[usize]> {
        match self {
            StepRecord::CountingIteration { count_snapshot, .. }
            | StepRecord::Counting { count_snapshot, .. }
            | StepRecord::Cumulative { count_snapshot, .. }
            | StepRecord::PositionLookup { count_snapshot, .. }
            | StepRecord::PositionCalculation { count_snapshot, .. }
            | StepRecord::Sorting { count_snapshot, .. } => Some(count_snapshot),
            StepRecord::Completion => None,
        }
    }

    pub fn output_snapshot(&self) -> Option<&[Option<i64>]> {
        match self {
            StepRecord::PositionLookup { output_snapshot, .. }
            | StepRecord::PositionCalculation { output_snapshot, .. }
            | StepRecord::Sorting { output_snapshot, .. } => Some(output_snapshot),
            _ => None,
        }
    }

    /// One-line human description. `min` is the smallest input value, used
    /// to explain the bucket offset during placement.
    pub fn describe(&self, min: i64) -> String {
        match self {
            StepRecord::CountingIteration { active_value, .. } => {
                format!("Scanning through count array for number {active_value}")
            }
            StepRecord::Counting { active_value, .. } => {
                format!("Adding 1 to count[{active_value}]")
            }
            StepRecord::Cumulative { position, previous_value, new_value, .. } => format!(
                "Adding previous count ({}) to position {position}",
                new_value.saturating_sub(*previous_value)
            ),
            StepRecord::PositionLookup { value, count_index, .. } => format!(
                "Finding count array position for {value} (number - {min} = {count_index})"
            ),
            StepRecord::PositionCalculation {
                value,
                count_index,
                count_value,
                target_position,
                ..
            } => format!(
                "Count[{count_index}] = {count_value}, so {value} goes to position {target_position}"
            ),
            StepRecord::Sorting { value, target_position, count_index, .. } => format!(
                "Placing {value} in position {target_position} and decreasing count[{count_index}]"
            ),
            StepRecord::Completion => "Sorting completed!".to_string(),
        }
    }
}

//! Instrumented counting sort: records every micro-operation as a `StepRecord`.

use serde::{Deserialize, Serialize};

use crate::{StepRecord, StepSortError, StepSortResult};

/// Default upper bound on the number of counting buckets.
///
/// This caps buckets, not trace size: each element scans up to `range`
/// buckets and every record copies the whole count array, so a trace holds
/// up to `n * range` records of `range` counters each.
pub const DEFAULT_MAX_RANGE: usize = 256;

/// Full output of one recorded sort. A pure function of `input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub input: Vec<i64>,
    pub min: i64,
    pub max: i64,
    pub steps: Vec<StepRecord>,
    pub sorted: Vec<i64>,
}

impl Recording {
    /// Number of counting buckets, `max - min + 1`.
    pub fn range(&self) -> usize {
        self.steps
            .first()
            .and_then(StepRecord::count_snapshot)
            .map(<[usize]>::len)
            .unwrap_or(0)
    }

    /// blake3 digest over the serialized step list.
    pub fn checksum(&self) -> StepSortResult<String> {
        let bytes = serde_json::to_vec(&self.steps)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Recorder {
    max_range: usize,
}

impl Default for Recorder {
    fn default() -> Self {
        Self { max_range: DEFAULT_MAX_RANGE }
    }
}

impl Recorder {
    pub fn new(max_range: usize) -> Self {
        Self { max_range }
    }

    pub fn record(&self, input: &[i64]) -> StepSortResult<Recording> {
        let (Some(&min), Some(&max)) = (input.iter().min(), input.iter().max()) else {
            return Err(StepSortError::EmptyInput);
        };
        let span = i128::from(max) - i128::from(min) + 1;
        if span > self.max_range as i128 {
            return Err(StepSortError::RangeTooLarge { min, max, limit: self.max_range });
        }
        let bucket = |v: i64| (i128::from(v) - i128::from(min)) as usize;

        let mut count = vec![0usize; span as usize];
        let mut steps = Vec::new();

        for (source_index, &value) in input.iter().enumerate() {
            let target_index = bucket(value);
            // One record per scanned bucket, up to and including the target.
            for scan_index in 0..=target_index {
                steps.push(StepRecord::CountingIteration {
                    active_value: value,
                    scan_index,
                    is_target_index: scan_index == target_index,
                    count_snapshot: count.clone(),
                    source_index,
                });
            }
            count[target_index] += 1;
            steps.push(StepRecord::Counting {
                active_value: value,
                target_index,
                count_snapshot: count.clone(),
                source_index,
            });
        }

        for position in 1..count.len() {
            let previous_value = count[position];
            count[position] += count[position - 1];
            steps.push(StepRecord::Cumulative {
                position,
                previous_value,
                new_value: count[position],
                count_snapshot: count.clone(),
            });
        }

        let mut output: Vec<Option<i64>> = vec![None; input.len()];
        for (source_index, &value) in input.iter().enumerate().rev() {
            let count_index = bucket(value);
            steps.push(StepRecord::PositionLookup {
                value,
                count_index,
                count_snapshot: count.clone(),
                output_snapshot: output.clone(),
                source_index: Some(source_index),
            });

            let count_value = count[count_index];
            let target_position = count_value - 1;
            steps.push(StepRecord::PositionCalculation {
                value,
                count_index,
                count_value,
                target_position,
                count_snapshot: count.clone(),
                output_snapshot: output.clone(),
                source_index: Some(source_index),
            });

            output[target_position] = Some(value);
            count[count_index] -= 1;
            steps.push(StepRecord::Sorting {
                value,
                target_position,
                count_index,
                count_snapshot: count.clone(),
                output_snapshot: output.clone(),
                source_index: Some(source_index),
            });
        }

        let sorted = output
            .into_iter()
            .enumerate()
            .map(|(slot, v)| {
                v.ok_or_else(|| {
                    StepSortError::InvalidArgument(format!("output slot {slot} was never written"))
                })
            })
            .collect::<StepSortResult<Vec<i64>>>()?;

        tracing::debug!(
            len = input.len(),
            min,
            max,
            steps = steps.len(),
            "recorded counting sort"
        );

        Ok(Recording { input: input.to_vec(), min, max, steps, sorted })
    }
}

/// Records `input` with the default bucket limit.
pub fn record(input: &[i64]) -> StepSortResult<Recording> {
    Recorder::default().record(input)
}

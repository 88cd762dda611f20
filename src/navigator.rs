//! Cursor over a recording: logical stepping, completion, and replay by
//! deterministic re-execution.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::{
    Config, HistoryBuffer, HistoryEntry, Recorder, Recording, StepRecord, StepSortError,
    StepSortResult,
};

/// How `Cumulative` records are grouped into logical steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeGrouping {
    /// One prefix-sum update per advance.
    #[default]
    Single,
    /// The whole run of prefix-sum updates in one advance.
    Batched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    Idle,
    Stepping,
    Complete,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavState::Idle => "idle",
            NavState::Stepping => "stepping",
            NavState::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Receives every entry the navigator pushes to history, in order,
/// including the synthetic completion entry.
pub trait StepObserver {
    fn on_step(&mut self, entry: &HistoryEntry);
}

impl<F: FnMut(&HistoryEntry)> StepObserver for F {
    fn on_step(&mut self, entry: &HistoryEntry) {
        self(entry)
    }
}

struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&mut self, _entry: &HistoryEntry) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advance {
    pub consumed: Vec<HistoryEntry>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replay {
    pub consumed: Vec<HistoryEntry>,
    pub current_step: usize,
}

#[derive(Debug)]
pub struct Navigator {
    recorder: Recorder,
    grouping: CumulativeGrouping,
    recording: Option<Recording>,
    current_step: usize,
    history: HistoryBuffer,
    /// Same capacity as `history`, but later scan positions are never
    /// pushed, so a long scan cannot evict its own first entry.
    visible: HistoryBuffer,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Navigator {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            recorder: Recorder::default(),
            grouping: CumulativeGrouping::default(),
            recording: None,
            current_step: 0,
            history: HistoryBuffer::new(history_capacity),
            visible: HistoryBuffer::new(history_capacity),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.history_capacity)
            .with_grouping(config.cumulative_grouping)
            .with_recorder(Recorder::new(config.max_range))
    }

    pub fn with_grouping(mut self, grouping: CumulativeGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn state(&self) -> NavState {
        match &self.recording {
            None => NavState::Idle,
            Some(r) if self.current_step < r.steps.len() => NavState::Stepping,
            Some(_) => NavState::Complete,
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn grouping(&self) -> CumulativeGrouping {
        self.grouping
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn steps(&self) -> &[StepRecord] {
        self.recording.as_ref().map(|r| r.steps.as_slice()).unwrap_or(&[])
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Records `input` and positions the cursor at step 0. On failure the
    /// navigator is left idle.
    pub fn start(&mut self, input: &[i64]) -> StepSortResult<()> {
        self.reset();
        let recording = self.recorder.record(input)?;
        tracing::info!(
            len = input.len(),
            steps = recording.steps.len(),
            "navigator session started"
        );
        self.recording = Some(recording);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.recording = None;
        self.current_step = 0;
        self.history.clear();
        self.visible.clear();
    }

    pub fn advance_one(&mut self) -> StepSortResult<Advance> {
        self.advance_one_with(&mut NoopObserver)
    }

    pub fn advance_one_with(&mut self, observer: &mut dyn StepObserver) -> StepSortResult<Advance> {
        let state = self.state();
        if state != NavState::Stepping {
            return Err(StepSortError::InvalidState { operation: "advance", state });
        }
        Ok(self.advance_unit(observer))
    }

    /// Advances until complete, returning every consumed record.
    pub fn run_to_completion(&mut self) -> StepSortResult<Vec<HistoryEntry>> {
        let state = self.state();
        if state == NavState::Idle {
            return Err(StepSortError::InvalidState { operation: "run to completion", state });
        }
        let mut consumed = Vec::new();
        while self.state() == NavState::Stepping {
            consumed.extend(self.advance_unit(&mut NoopObserver).consumed);
        }
        Ok(consumed)
    }

    pub fn replay_to(&mut self, target: usize) -> StepSortResult<Replay> {
        self.replay_to_with(target, &mut NoopObserver)
    }

    /// Rebuilds cursor and history as if the caller had advanced from the
    /// start until `target` was consumed. Invalid targets leave all state
    /// untouched.
    pub fn replay_to_with(
        &mut self,
        target: usize,
        observer: &mut dyn StepObserver,
    ) -> StepSortResult<Replay> {
        let Some(recording) = self.recording.as_ref() else {
            return Err(StepSortError::InvalidState { operation: "replay", state: NavState::Idle });
        };
        let len = recording.steps.len();
        if target >= len {
            return Err(StepSortError::InvalidStepIndex { index: target, len });
        }

        self.history.clear();
        self.visible.clear();
        self.current_step = 0;
        let mut consumed = Vec::new();
        while self.current_step <= target {
            consumed.extend(self.advance_unit(observer).consumed);
        }
        tracing::debug!(target, current_step = self.current_step, "replayed");
        Ok(Replay { consumed, current_step: self.current_step })
    }

    pub fn history_snapshot(&self, n: usize) -> Vec<HistoryEntry> {
        self.history.last(n)
    }

    /// History as shown to a reader: bucket scans collapse to their first
    /// scanned position before they count against capacity.
    pub fn visible_history(&self, n: usize) -> Vec<HistoryEntry> {
        self.visible.last(n)
    }

    /// Buckets incremented by the `Counting` records consumed so far, in
    /// first-touched order.
    pub fn discovered_buckets(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for step in self.steps().iter().take(self.current_step) {
            if let StepRecord::Counting { target_index, .. } = step
                && !out.contains(target_index)
            {
                out.push(*target_index);
            }
        }
        out
    }

    pub fn highlight(&self, record: &StepRecord) -> Option<usize> {
        let input = self.recording.as_ref().map(|r| r.input.as_slice()).unwrap_or(&[]);
        highlight_index(record, input)
    }

    /// Consumes one logical unit starting at the cursor. Caller guarantees
    /// the navigator is stepping.
    fn advance_unit(&mut self, observer: &mut dyn StepObserver) -> Advance {
        let Some(recording) = self.recording.as_ref() else {
            return Advance { consumed: Vec::new(), done: false };
        };
        let steps = &recording.steps;
        let start = self.current_step;
        let end = unit_end(steps, start, self.grouping);

        let mut consumed = Vec::with_capacity(end - start);
        for (index, record) in steps.iter().enumerate().take(end).skip(start) {
            let entry = HistoryEntry { index, record: record.clone() };
            self.history.push(index, record.clone());
            if !is_later_scan(record) {
                self.visible.push(index, record.clone());
            }
            observer.on_step(&entry);
            consumed.push(entry);
        }
        self.current_step = end;

        let done = end == steps.len();
        if done {
            let entry = HistoryEntry { index: end, record: StepRecord::Completion };
            self.history.push(entry.index, StepRecord::Completion);
            self.visible.push(entry.index, StepRecord::Completion);
            observer.on_step(&entry);
            tracing::info!(steps = end, "navigator reached completion");
        }
        tracing::debug!(start, end, "advanced one logical step");
        Advance { consumed, done }
    }
}

fn is_later_scan(record: &StepRecord) -> bool {
    matches!(record, StepRecord::CountingIteration { scan_index, .. } if *scan_index != 0)
}

/// Exclusive end of the logical unit beginning at `start`.
fn unit_end(steps: &[StepRecord], start: usize, grouping: CumulativeGrouping) -> usize {
    match steps.get(start) {
        Some(StepRecord::CountingIteration { active_value, source_index, .. }) => {
            let (value, src) = (*active_value, *source_index);
            let mut end = start;
            while matches!(
                steps.get(end),
                Some(StepRecord::CountingIteration { active_value, source_index, .. })
                    if *active_value == value && *source_index == src
            ) {
                end += 1;
            }
            if matches!(
                steps.get(end),
                Some(StepRecord::Counting { active_value, source_index, .. })
                    if *active_value == value && *source_index == src
            ) {
                end += 1;
            }
            end
        }
        Some(StepRecord::Cumulative { .. }) if grouping == CumulativeGrouping::Batched => {
            let mut end = start;
            while matches!(steps.get(end), Some(StepRecord::Cumulative { .. })) {
                end += 1;
            }
            end
        }
        Some(_) => start + 1,
        None => start,
    }
}

/// Index in the original `input` to highlight for `record`.
///
/// Uses the record's source index when present. Records without an
/// associated input element (`Cumulative`, `Completion`) highlight nothing.
/// Otherwise falls back to the first occurrence of the value, which is only
/// an approximation when values repeat.
pub fn highlight_index(record: &StepRecord, input: &[i64]) -> Option<usize> {
    if let Some(src) = record.source_index() {
        return Some(src);
    }
    let value = record.value()?;
    input.iter().position(|&v| v == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepKind;

    fn started(input: &[i64], capacity: usize, grouping: CumulativeGrouping) -> Navigator {
        let mut nav = Navigator::new(capacity).with_grouping(grouping);
        nav.start(input).expect("start");
        nav
    }

    fn kinds(entries: &[HistoryEntry]) -> Vec<StepKind> {
        entries.iter().map(|e| e.record.kind()).collect()
    }

    #[test]
    fn empty_input_leaves_navigator_idle() {
        let mut nav = Navigator::new(10);
        nav.start(&[1, 2]).expect("start");
        let err = nav.start(&[]).expect_err("empty");
        assert!(matches!(err, StepSortError::EmptyInput));
        assert_eq!(nav.state(), NavState::Idle);
        assert!(nav.history().is_empty());
    }

    #[test]
    fn advance_requires_stepping_state() {
        let mut nav = Navigator::new(10);
        let err = nav.advance_one().expect_err("idle");
        assert!(matches!(
            err,
            StepSortError::InvalidState { state: NavState::Idle, .. }
        ));
    }

    #[test]
    fn bucket_scan_collapses_into_one_advance() {
        let mut nav = started(&[3, 1, 2], 32, CumulativeGrouping::Single);
        // 3 maps to bucket 2: three scans then the increment.
        let adv = nav.advance_one().expect("advance");
        assert_eq!(
            kinds(&adv.consumed),
            vec![
                StepKind::CountingIteration,
                StepKind::CountingIteration,
                StepKind::CountingIteration,
                StepKind::Counting,
            ]
        );
        assert!(!adv.done);
        assert_eq!(nav.current_step(), 4);

        let adv = nav.advance_one().expect("advance");
        assert_eq!(
            kinds(&adv.consumed),
            vec![StepKind::CountingIteration, StepKind::Counting]
        );
    }

    #[test]
    fn equal_adjacent_values_scan_separately() {
        let mut nav = started(&[5, 5], 32, CumulativeGrouping::Single);
        let first = nav.advance_one().expect("first");
        let second = nav.advance_one().expect("second");
        assert_eq!(first.consumed.last().and_then(|e| e.record.source_index()), Some(0));
        assert_eq!(second.consumed.last().and_then(|e| e.record.source_index()), Some(1));
    }

    #[test]
    fn cumulative_grouping_policies() {
        let input = [0, 4];
        let mut single = started(&input, 64, CumulativeGrouping::Single);
        let mut batched = started(&input, 64, CumulativeGrouping::Batched);
        for nav in [&mut single, &mut batched] {
            nav.advance_one().expect("count 0");
            nav.advance_one().expect("count 4");
        }
        assert_eq!(single.advance_one().expect("one").consumed.len(), 1);
        let batch = batched.advance_one().expect("batch").consumed;
        assert_eq!(batch.len(), 4);
        assert!(batch.iter().all(|e| e.record.kind() == StepKind::Cumulative));
        assert_eq!(
            batched.steps()[batched.current_step()].kind(),
            StepKind::PositionLookup
        );
    }

    #[test]
    fn completion_is_pushed_and_terminal() {
        let mut nav = started(&[4], 10, CumulativeGrouping::Single);
        let mut last = None;
        while nav.state() == NavState::Stepping {
            last = Some(nav.advance_one().expect("advance"));
        }
        let last = last.expect("advanced at least once");
        assert!(last.done);
        assert_eq!(kinds(&last.consumed), vec![StepKind::Sorting]);
        assert_eq!(nav.state(), NavState::Complete);

        let hist = nav.history_snapshot(10);
        let tail = hist.last().expect("entries");
        assert_eq!(tail.record, StepRecord::Completion);
        assert_eq!(tail.index, nav.steps().len());

        assert!(matches!(
            nav.advance_one(),
            Err(StepSortError::InvalidState { state: NavState::Complete, .. })
        ));
    }

    #[test]
    fn run_to_completion_consumes_everything() {
        let mut nav = started(&[2, 0, 1], 5, CumulativeGrouping::Batched);
        let consumed = nav.run_to_completion().expect("run");
        assert_eq!(consumed.len(), nav.steps().len());
        assert_eq!(nav.state(), NavState::Complete);
        assert!(nav.run_to_completion().expect("noop").is_empty());
    }

    #[test]
    fn replay_matches_manual_stepping() {
        let inputs: [&[i64]; 3] = [&[3, 1, 2], &[5, 5, 2, -1, 5], &[0, 3, 3, 1]];
        for grouping in [CumulativeGrouping::Single, CumulativeGrouping::Batched] {
            for input in inputs {
                let len = record_len(input);
                for target in 0..len {
                    let mut manual = started(input, 4, grouping);
                    while manual.current_step() <= target {
                        manual.advance_one().expect("advance");
                    }

                    let mut replayed = started(input, 4, grouping);
                    replayed.run_to_completion().expect("wander off first");
                    replayed.replay_to(target).expect("replay");

                    assert_eq!(replayed.current_step(), manual.current_step(), "{input:?} @ {target}");
                    assert_eq!(replayed.history_snapshot(4), manual.history_snapshot(4));
                    assert_eq!(replayed.state(), manual.state());
                }
            }
        }
    }

    fn record_len(input: &[i64]) -> usize {
        crate::record(input).expect("record").steps.len()
    }

    #[test]
    fn out_of_range_replay_leaves_state_untouched() {
        let mut nav = started(&[2, 1], 10, CumulativeGrouping::Single);
        nav.advance_one().expect("advance");
        let before_step = nav.current_step();
        let before_hist = nav.history_snapshot(10);
        let len = nav.steps().len();

        let err = nav.replay_to(len).expect_err("out of range");
        assert!(matches!(err, StepSortError::InvalidStepIndex { index, len: l } if index == len && l == len));
        assert_eq!(nav.current_step(), before_step);
        assert_eq!(nav.history_snapshot(10), before_hist);

        nav.reset();
        assert!(matches!(
            nav.replay_to(0),
            Err(StepSortError::InvalidState { state: NavState::Idle, .. })
        ));
    }

    #[test]
    fn observer_sees_entries_in_push_order() {
        let mut nav = started(&[1], 10, CumulativeGrouping::Single);
        let mut seen = Vec::new();
        let mut observer = |e: &HistoryEntry| seen.push(e.index);
        nav.advance_one_with(&mut observer).expect("scan");
        nav.advance_one_with(&mut observer).expect("lookup");
        nav.advance_one_with(&mut observer).expect("calc");
        nav.advance_one_with(&mut observer).expect("sort");
        // Indices 0..=4 are real records, 5 is the completion marker.
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn replay_returns_and_observes_consumed_records_in_order() {
        let mut nav = started(&[2, 0, 2], 10, CumulativeGrouping::Single);
        let len = nav.steps().len();

        let mut seen = Vec::new();
        let mut observer = |e: &HistoryEntry| seen.push(e.index);
        let replay = nav.replay_to_with(5, &mut observer).expect("replay");
        let consumed: Vec<usize> = replay.consumed.iter().map(|e| e.index).collect();
        assert_eq!(consumed, (0..replay.current_step).collect::<Vec<_>>());
        assert_eq!(seen, consumed);
        assert_eq!(replay.current_step, nav.current_step());
        for e in &replay.consumed {
            assert_eq!(&e.record, &nav.steps()[e.index]);
        }

        // Replaying into the final unit also reports the completion marker.
        let mut seen = Vec::new();
        let mut observer = |e: &HistoryEntry| seen.push(e.index);
        let replay = nav.replay_to_with(len - 1, &mut observer).expect("replay to end");
        assert_eq!(replay.current_step, len);
        assert_eq!(replay.consumed.len(), len);
        assert_eq!(seen, (0..=len).collect::<Vec<_>>());
        assert_eq!(nav.state(), NavState::Complete);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut nav = started(&[3, 3], 10, CumulativeGrouping::Single);
        nav.advance_one().expect("advance");
        nav.reset();
        assert_eq!(nav.state(), NavState::Idle);
        assert_eq!(nav.current_step(), 0);
        assert!(nav.steps().is_empty());
        assert!(nav.history_snapshot(10).is_empty());
    }

    #[test]
    fn discovered_buckets_follow_consumed_counts() {
        let mut nav = started(&[2, 0, 2, 1], 10, CumulativeGrouping::Single);
        assert!(nav.discovered_buckets().is_empty());
        nav.advance_one().expect("2");
        nav.advance_one().expect("0");
        nav.advance_one().expect("2 again");
        assert_eq!(nav.discovered_buckets(), vec![2, 0]);
        nav.advance_one().expect("1");
        assert_eq!(nav.discovered_buckets(), vec![2, 0, 1]);
    }

    #[test]
    fn visible_history_keeps_first_scan_only() {
        let mut nav = started(&[0, 2], 10, CumulativeGrouping::Single);
        nav.advance_one().expect("scan for 0");
        nav.advance_one().expect("scan for 2");
        assert_eq!(nav.history_snapshot(10).len(), 6);
        let visible = nav.visible_history(10);
        assert_eq!(
            kinds(&visible),
            vec![
                StepKind::CountingIteration,
                StepKind::Counting,
                StepKind::CountingIteration,
                StepKind::Counting,
            ]
        );
    }

    #[test]
    fn long_scan_keeps_its_first_entry_visible() {
        // 15 scans sixteen buckets, more than the ten-entry history holds.
        let mut nav = started(&[0, 15], 10, CumulativeGrouping::Single);
        nav.advance_one().expect("scan for 0");
        nav.advance_one().expect("scan for 15");
        assert!(nav.history_snapshot(10).iter().all(|e| e.index >= 8));

        let visible = nav.visible_history(10);
        let summary: Vec<(usize, StepKind)> =
            visible.iter().map(|e| (e.index, e.record.kind())).collect();
        assert_eq!(
            summary,
            vec![
                (0, StepKind::CountingIteration),
                (1, StepKind::Counting),
                (2, StepKind::CountingIteration),
                (18, StepKind::Counting),
            ]
        );

        nav.replay_to(1).expect("replay");
        assert_eq!(nav.visible_history(10).len(), 2);
        nav.reset();
        assert!(nav.visible_history(10).is_empty());
    }

    #[test]
    fn highlight_resolves_duplicates_by_source_index() {
        let input = [7, 3, 7];
        let nav = started(&input, 10, CumulativeGrouping::Single);
        let first_lookup = nav
            .steps()
            .iter()
            .find(|s| s.kind() == StepKind::PositionLookup)
            .expect("lookup");
        // Placement runs right to left, so the first lookup is the last 7.
        assert_eq!(nav.highlight(first_lookup), Some(2));

        let cumulative = nav
            .steps()
            .iter()
            .find(|s| s.kind() == StepKind::Cumulative)
            .expect("cumulative");
        assert_eq!(nav.highlight(cumulative), None);
        assert_eq!(highlight_index(&StepRecord::Completion, &input), None);

        let legacy = StepRecord::Sorting {
            value: 7,
            target_position: 2,
            count_index: 4,
            count_snapshot: Vec::new(),
            output_snapshot: Vec::new(),
            source_index: None,
        };
        assert_eq!(highlight_index(&legacy, &input), Some(0));
    }
}

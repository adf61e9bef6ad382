//! Timeline composition and playback.
//!
//! A timeline sequences tweens with relative start offsets and plays or
//! reverses them as one unit. Playback runs a single master clock and samples
//! every entry against it, so reversing mid-flight simply flips the clock
//! direction and continues from the current interpolated state, with no
//! kill, respawn or snap. A fully reversed timeline restores exact `from` values.

use serde::{Deserialize, Serialize};

use crate::compose::FrameAccumulator;
use crate::ids::{SectionId, TimelineId};
use crate::outputs::{CoreEvent, Outputs};
use crate::tween::{run_guarded, Repeat, TweenSpec};

/// Where a new entry starts, resolved against the previously added entry at
/// `add` time and immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Offset {
    /// Absolute seconds from timeline start.
    At(f32),
    /// Relative to the previous entry's end; negative overlaps it
    /// ("start 0.4s before the previous entry ends" is `AfterPrev(-0.4)`).
    AfterPrev(f32),
    /// Relative to the previous entry's start.
    WithPrev(f32),
}

pub(crate) struct TimelineEntry {
    pub offset: f32,
    pub spec: TweenSpec,
    /// Forward completion already reported.
    pub completed: bool,
    /// Entry disabled after a callback panic or missing target.
    pub dead: bool,
}

/// Builder for a timeline. Offsets resolve at `add` time.
#[derive(Default)]
pub struct TimelineBuilder {
    entries: Vec<(f32, TweenSpec)>,
    prev_start: f32,
    prev_end: f32,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the given offset. The timeline start is clamped to
    /// zero so a large negative overlap cannot schedule before t=0.
    pub fn add(mut self, spec: TweenSpec, offset: Offset) -> Self {
        let start = match offset {
            Offset::At(t) => t,
            Offset::AfterPrev(delta) => self.prev_end + delta,
            Offset::WithPrev(delta) => self.prev_start + delta,
        }
        .max(0.0);
        self.prev_start = start;
        self.prev_end = start + spec.duration;
        self.entries.push((start, spec));
        self
    }

    /// Append an entry right after the previous one ends.
    pub fn then(self, spec: TweenSpec) -> Self {
        self.add(spec, Offset::AfterPrev(0.0))
    }

    /// Append a run of entries, the first at `offset`, each subsequent one
    /// starting `step` seconds after the previous one's start (character and
    /// card reveals).
    pub fn stagger(mut self, specs: Vec<TweenSpec>, step: f32, offset: Offset) -> Self {
        let mut first = true;
        for spec in specs {
            let at = if first { offset } else { Offset::WithPrev(step) };
            self = self.add(spec, at);
            first = false;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(f32, TweenSpec)> {
        self.entries
    }
}

/// Playback state of a timeline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimelineState {
    /// Built but never played; properties are at their initial/hidden state.
    #[default]
    Idle,
    PlayingForward,
    /// Forward playback finished; finite entries rest at `to`.
    Played,
    Reversing,
    /// Reverse playback finished; finite entries rest at `from`.
    Reverted,
}

pub(crate) struct Timeline {
    pub id: TimelineId,
    pub section: SectionId,
    pub entries: Vec<TimelineEntry>,
    /// Total duration over finite entries; infinite loops are excluded.
    pub duration: f32,
    /// Master clock in [0, duration].
    pub time: f32,
    /// Free-running clock for infinite entries; starts at first play and
    /// keeps counting until the timeline is killed.
    pub ambient: f32,
    pub state: TimelineState,
}

impl Timeline {
    pub fn new(id: TimelineId, section: SectionId, builder: TimelineBuilder) -> Self {
        let mut entries: Vec<TimelineEntry> = builder
            .into_entries()
            .into_iter()
            .map(|(offset, spec)| TimelineEntry {
                offset,
                spec,
                completed: false,
                dead: false,
            })
            .collect();
        // Schedule order: entries execute in non-decreasing resolved offset
        // order; the sort is stable so equal offsets keep insertion order.
        entries.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        let duration = entries
            .iter()
            .filter(|e| matches!(e.spec.repeat, Repeat::Once))
            .map(|e| e.offset + e.spec.duration)
            .fold(0.0_f32, f32::max);
        Self {
            id,
            section,
            entries,
            duration,
            time: 0.0,
            ambient: 0.0,
            state: TimelineState::Idle,
        }
    }

    /// Start or resume forward playback. No-op while already playing forward
    /// or already played (prevents duplicate concurrent animation of the same
    /// properties). Returns whether the call changed anything.
    pub fn play(&mut self) -> bool {
        match self.state {
            TimelineState::PlayingForward | TimelineState::Played => false,
            TimelineState::Idle | TimelineState::Reverted => {
                self.time = 0.0;
                for e in &mut self.entries {
                    e.completed = false;
                }
                self.state = TimelineState::PlayingForward;
                true
            }
            // Mid-reverse: flip direction from the current clock value.
            TimelineState::Reversing => {
                self.state = TimelineState::PlayingForward;
                true
            }
        }
    }

    /// Reverse playback from the current clock value. No-op while already
    /// reversing or reverted, and before the first play (there is nothing to
    /// restore).
    pub fn reverse(&mut self) -> bool {
        match self.state {
            TimelineState::Reversing | TimelineState::Reverted | TimelineState::Idle => false,
            TimelineState::PlayingForward | TimelineState::Played => {
                self.state = TimelineState::Reversing;
                true
            }
        }
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    /// Advance the master clock and write this frame's samples into the
    /// accumulator. Entry callbacks run behind the panic guard; a panicking
    /// entry is killed rather than corrupting the shared frame loop.
    pub fn advance(&mut self, dt: f32, accum: &mut FrameAccumulator, outputs: &mut Outputs) {
        if self.state == TimelineState::Idle {
            return;
        }
        self.ambient += dt;

        match self.state {
            TimelineState::PlayingForward => {
                self.time += dt;
                if self.time >= self.duration {
                    self.time = self.duration;
                    self.state = TimelineState::Played;
                    self.sample_finite(accum, outputs);
                    outputs.push_event(CoreEvent::TimelineCompleted { timeline: self.id });
                } else {
                    self.sample_finite(accum, outputs);
                }
            }
            TimelineState::Reversing => {
                self.time -= dt;
                if self.time <= 0.0 {
                    self.time = 0.0;
                    self.state = TimelineState::Reverted;
                    self.sample_finite(accum, outputs);
                    outputs.push_event(CoreEvent::TimelineReverted { timeline: self.id });
                } else {
                    self.sample_finite(accum, outputs);
                }
            }
            // Finite entries already rest at their exact end values.
            TimelineState::Played | TimelineState::Reverted | TimelineState::Idle => {}
        }

        self.sample_infinite(accum);
    }

    /// Sample non-repeating entries at the master clock. Entries before their
    /// window contribute exact `from` values (the initial hidden state),
    /// entries past it exact `to` values.
    fn sample_finite(&mut self, accum: &mut FrameAccumulator, outputs: &mut Outputs) {
        let forward = matches!(
            self.state,
            TimelineState::PlayingForward | TimelineState::Played
        );
        for entry in &mut self.entries {
            if entry.dead || !matches!(entry.spec.repeat, Repeat::Once) {
                continue;
            }
            let p = ((self.time - entry.offset) / entry.spec.duration).clamp(0.0, 1.0);
            let mut first_value = None;
            for seg in &entry.spec.segments {
                let value = seg.sample(p, entry.spec.easing);
                first_value.get_or_insert(value);
                accum.push(entry.spec.target, &seg.prop, value, entry.spec.channel);
            }
            let mut panicked = false;
            if let (Some(value), Some(cb)) = (first_value, entry.spec.on_update.as_mut()) {
                if let Err(message) = run_guarded("timeline on_update", || cb(value)) {
                    outputs.push_event(CoreEvent::CallbackPanicked { message });
                    panicked = true;
                }
            }
            if panicked {
                entry.dead = true;
                continue;
            }
            if forward && p >= 1.0 && !entry.completed {
                entry.completed = true;
                if let Some(cb) = entry.spec.on_complete.take() {
                    if let Err(message) = run_guarded("timeline on_complete", || cb()) {
                        outputs.push_event(CoreEvent::CallbackPanicked { message });
                        entry.dead = true;
                    }
                }
            }
        }
    }

    /// Infinite loops run off the free clock from first play until kill,
    /// regardless of forward/reverse state.
    fn sample_infinite(&mut self, accum: &mut FrameAccumulator) {
        for entry in &self.entries {
            if entry.dead || matches!(entry.spec.repeat, Repeat::Once) {
                continue;
            }
            let local = (self.ambient - entry.offset).max(0.0);
            let p = entry.spec.cycle_progress(local);
            for seg in &entry.spec.segments {
                let value = seg.sample(p, entry.spec.easing);
                accum.push(entry.spec.target, &seg.prop, value, entry.spec.channel);
            }
        }
    }
}

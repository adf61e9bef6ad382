//! Per-frame accumulation of channel writes into one composed batch per
//! target.
//!
//! Two subsystems may animate the same element: scroll-triggered entrance
//! timelines own absolute values, pointer interaction layers small deltas on
//! top. Rather than letting both write the same raw property and race, writes
//! carry a [`Channel`] and are composed here at the end of the frame:
//! Base writes replace (last write in schedule order wins), Offset writes add
//! on top of the last committed base value.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::TargetId;
use crate::target::{PropertyBatch, PropertyWrite};

/// Which composition channel a write belongs to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Channel {
    /// Absolute values from tweens and timelines.
    #[default]
    Base,
    /// Additive deltas from the interaction tracker.
    Offset,
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    base: Option<f32>,
    offset: f32,
    has_offset: bool,
}

/// Scratch accumulator reused across frames.
#[derive(Debug, Default)]
pub(crate) struct FrameAccumulator {
    slots: HashMap<(TargetId, String), Slot>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.slots.clear();
    }

    pub fn push(&mut self, target: TargetId, prop: &str, value: f32, channel: Channel) {
        let slot = self
            .slots
            .entry((target, prop.to_string()))
            .or_insert_with(Slot::default);
        match channel {
            Channel::Base => slot.base = Some(value),
            Channel::Offset => {
                slot.offset += value;
                slot.has_offset = true;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Compose this frame's writes into one batch per touched target.
    ///
    /// `committed` holds the last Base value written per (target, property);
    /// Offset-only frames fall back to it so deltas stay anchored to the value
    /// the entrance animation left behind. Base writes update it.
    /// Output is sorted for deterministic batches.
    pub fn finalize(
        &mut self,
        committed: &mut HashMap<(TargetId, String), f32>,
    ) -> Vec<(TargetId, PropertyBatch)> {
        let mut flat: Vec<(TargetId, String, f32)> = Vec::with_capacity(self.slots.len());
        for ((target, prop), slot) in self.slots.drain() {
            let key = (target, prop);
            let base = match slot.base {
                Some(v) => {
                    committed.insert(key.clone(), v);
                    v
                }
                None => committed.get(&key).copied().unwrap_or(0.0),
            };
            let value = if slot.has_offset {
                base + slot.offset
            } else {
                base
            };
            flat.push((key.0, key.1, value));
        }
        flat.sort_by(|a, b| (a.0 .0, a.1.as_str()).cmp(&(b.0 .0, b.1.as_str())));

        let mut out: Vec<(TargetId, PropertyBatch)> = Vec::new();
        for (target, prop, value) in flat {
            match out.last_mut() {
                Some((t, batch)) if *t == target => batch.push(PropertyWrite::new(prop, value)),
                _ => out.push((
                    target,
                    PropertyBatch(vec![PropertyWrite::new(prop, value)]),
                )),
            }
        }
        out
    }
}

//! The orchestration engine: owns targets, tweens, timelines, triggers and
//! interaction bindings, and steps them all from one cooperative per-frame
//! clock.
//!
//! `update(dt, inputs)` is the only place animation state advances. The frame
//! runs in a fixed order: trigger evaluation, pointer routing, clock
//! advancement, then composition and a single batched write per touched
//! target. Within one frame every sampler reads the same clock, so a
//! re-entrant schedule (a trigger starting a timeline) takes effect on the
//! same tick it fired.

use hashbrown::HashMap;

use crate::compose::FrameAccumulator;
use crate::config::Config;
use crate::error::{AnimationError, Result};
use crate::ids::{BindingId, IdAllocator, SectionId, TargetId, TimelineId, TriggerId, TweenId};
use crate::inputs::{Inputs, PointerEventKind, Viewport};
use crate::interaction::{Binding, InteractionSpec};
use crate::outputs::{Change, CoreEvent, Outputs};
use crate::stored::SectionBlueprint;
use crate::target::{AnimationTarget, Rect};
use crate::timeline::{Timeline, TimelineBuilder, TimelineState};
use crate::trigger::{ToggleAction, Trigger, TriggerSpec, TriggerState};
use crate::tween::{run_guarded, Repeat, TweenSpec};

struct RegisteredTarget {
    section: SectionId,
    surface: Box<dyn AnimationTarget>,
}

/// A standalone tween with its runtime clock.
struct RunningTween {
    id: TweenId,
    section: SectionId,
    spec: TweenSpec,
    elapsed: f32,
    done: bool,
}

/// Ids of everything a mounted stored section created, for callers that want
/// to drive or tear down the pieces individually.
#[derive(Clone, Debug)]
pub struct MountedSection {
    pub timeline: TimelineId,
    pub loops: Vec<TweenId>,
    pub trigger: Option<TriggerId>,
}

#[derive(Default)]
pub struct Engine {
    config: Config,
    ids: IdAllocator,
    targets: HashMap<TargetId, RegisteredTarget>,
    tweens: Vec<RunningTween>,
    timelines: Vec<Timeline>,
    triggers: Vec<Trigger>,
    bindings: Vec<Binding>,
    /// Latest viewport snapshot; scroll bursts between frames collapse here.
    viewport: Option<Viewport>,
    /// Last Base value per (target, property); anchors Offset-only frames.
    committed: HashMap<(TargetId, String), f32>,
    /// Events raised between frames (registration-time degradations); drained
    /// into the next frame's outputs.
    pending: Vec<CoreEvent>,
    accum: FrameAccumulator,
    outputs: Outputs,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let outputs = Outputs::with_capacity(config.change_capacity, config.max_events_per_tick);
        Self {
            tweens: Vec::with_capacity(config.tween_capacity),
            outputs,
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ----- sections and targets -----

    /// Open an ownership scope. Everything registered under it is torn down
    /// together by [`release_section`](Self::release_section).
    pub fn create_section(&mut self) -> SectionId {
        self.ids.alloc_section()
    }

    pub fn register_target(
        &mut self,
        section: SectionId,
        surface: Box<dyn AnimationTarget>,
    ) -> TargetId {
        let id = self.ids.alloc_target();
        self.targets.insert(id, RegisteredTarget { section, surface });
        id
    }

    /// Current value of a property as the target reports it.
    pub fn target_value(&self, target: TargetId, prop: &str) -> Option<f32> {
        self.targets.get(&target)?.surface.get(prop)
    }

    /// Live geometry, for callers that size or position things off animated
    /// elements. Strict: a missing target is an error here, not a no-op.
    pub fn target_bounds(&self, target: TargetId) -> Result<Rect> {
        match self.targets.get(&target) {
            Some(reg) => Ok(reg.surface.bounds()),
            None => Err(AnimationError::MissingTarget { target }),
        }
    }

    // ----- tweens -----

    /// Validate and start a standalone tween. A spec naming a property the
    /// target does not expose fails; a spec naming a target that is gone
    /// degrades to an inert handle and reports `TargetMissing` instead of
    /// erroring, so one stale registration cannot take down a whole section
    /// setup.
    pub fn start_tween(&mut self, section: SectionId, spec: TweenSpec) -> Result<TweenId> {
        spec.validate()?;
        let id = self.ids.alloc_tween();
        match self.targets.get(&spec.target) {
            Some(reg) => {
                for seg in &spec.segments {
                    if reg.surface.get(&seg.prop).is_none() {
                        return Err(AnimationError::InvalidTween {
                            reason: format!(
                                "target {:?} has no property '{}'",
                                spec.target, seg.prop
                            ),
                        });
                    }
                }
            }
            None => {
                log::warn!("tween {id:?} names missing target {:?}", spec.target);
                self.pending
                    .push(CoreEvent::TargetMissing { target: spec.target });
                return Ok(id);
            }
        }
        self.tweens.push(RunningTween {
            id,
            section,
            spec,
            elapsed: 0.0,
            done: false,
        });
        Ok(id)
    }

    /// Stop a tween where it is. Idempotent; `on_complete` does not fire.
    pub fn kill_tween(&mut self, id: TweenId) {
        self.tweens.retain(|t| t.id != id);
    }

    pub fn tween_is_active(&self, id: TweenId) -> bool {
        self.tweens.iter().any(|t| t.id == id && !t.done)
    }

    // ----- timelines -----

    /// Build a timeline from its schedule. Entries are validated up front;
    /// entries naming missing targets are kept (their writes drop harmlessly)
    /// but reported.
    pub fn add_timeline(&mut self, section: SectionId, builder: TimelineBuilder) -> Result<TimelineId> {
        if builder.is_empty() {
            return Err(AnimationError::InvalidTween {
                reason: "timeline has no entries".to_string(),
            });
        }
        let timeline = Timeline::new(self.ids.alloc_timeline(), section, builder);
        for entry in &timeline.entries {
            entry.spec.validate()?;
            if !self.targets.contains_key(&entry.spec.target) {
                log::warn!(
                    "timeline {:?} entry names missing target {:?}",
                    timeline.id,
                    entry.spec.target
                );
                self.pending.push(CoreEvent::TargetMissing {
                    target: entry.spec.target,
                });
            }
        }
        let id = timeline.id;
        self.timelines.push(timeline);
        Ok(id)
    }

    /// Forward-play a timeline. Returns whether anything changed; a second
    /// play while playing or played is a no-op so the same properties are
    /// never animated twice concurrently.
    pub fn play_timeline(&mut self, id: TimelineId) -> bool {
        self.timelines
            .iter_mut()
            .find(|t| t.id == id)
            .is_some_and(|t| t.play())
    }

    /// Reverse a timeline from wherever its clock currently is. No snap, no
    /// restart; samples retrace the same curve backwards.
    pub fn reverse_timeline(&mut self, id: TimelineId) -> bool {
        self.timelines
            .iter_mut()
            .find(|t| t.id == id)
            .is_some_and(|t| t.reverse())
    }

    pub fn timeline_state(&self, id: TimelineId) -> Option<TimelineState> {
        self.timelines.iter().find(|t| t.id == id).map(|t| t.state())
    }

    /// Remove a timeline mid-flight. Idempotent; attached triggers are
    /// disabled rather than left pointing at nothing.
    pub fn kill_timeline(&mut self, id: TimelineId) {
        self.timelines.retain(|t| t.id != id);
        for trigger in self.triggers.iter_mut().filter(|t| t.spec.timeline == id) {
            trigger.disabled = true;
        }
    }

    // ----- triggers -----

    /// Attach a viewport trigger to a timeline. Each timeline takes at most
    /// one trigger; a second registration fails with `TimelineInUse`. A
    /// missing watch target degrades to a disabled trigger plus a
    /// `TargetMissing` report.
    pub fn register_trigger(&mut self, section: SectionId, spec: TriggerSpec) -> Result<TriggerId> {
        spec.validate()?;
        if !self.timelines.iter().any(|t| t.id == spec.timeline) {
            return Err(AnimationError::InvalidTrigger {
                reason: format!("no such timeline: {:?}", spec.timeline),
            });
        }
        if self
            .triggers
            .iter()
            .any(|t| t.spec.timeline == spec.timeline && !t.disabled)
        {
            return Err(AnimationError::TimelineInUse {
                timeline: spec.timeline,
            });
        }
        let id = self.ids.alloc_trigger();
        let mut trigger = Trigger::new(id, section, spec);
        if !self.targets.contains_key(&spec.target) {
            log::warn!("trigger {id:?} names missing target {:?}", spec.target);
            self.pending
                .push(CoreEvent::TargetMissing { target: spec.target });
            trigger.disabled = true;
        }
        self.triggers.push(trigger);
        Ok(id)
    }

    pub fn trigger_state(&self, id: TriggerId) -> Option<TriggerState> {
        self.triggers.iter().find(|t| t.id == id).map(|t| t.state)
    }

    /// Idempotent removal. The attached timeline stays wherever it is.
    pub fn remove_trigger(&mut self, id: TriggerId) {
        self.triggers.retain(|t| t.id != id);
    }

    // ----- interaction bindings -----

    /// Bind a pointer response to a target. A missing target degrades to a
    /// disabled binding plus a `TargetMissing` report. Offsets anchor to the
    /// value each declared property holds when the binding is created, unless
    /// a base tween has already committed one.
    pub fn bind_interaction(&mut self, section: SectionId, spec: InteractionSpec) -> Result<BindingId> {
        spec.validate()?;
        let id = self.ids.alloc_binding();
        let target = spec.target;
        let props = spec.props.clone();
        let mut binding = Binding::new(
            id,
            section,
            spec,
            self.config.move_duration,
            self.config.rest_duration,
        );
        match self.targets.get(&target) {
            Some(registered) => {
                for prop in &props {
                    if let Some(value) = registered.surface.get(prop) {
                        self.committed.entry((target, prop.clone())).or_insert(value);
                    }
                }
            }
            None => {
                log::warn!("binding {id:?} names missing target {target:?}");
                self.pending.push(CoreEvent::TargetMissing { target });
                binding.disabled = true;
            }
        }
        self.bindings.push(binding);
        Ok(id)
    }

    /// Current interaction offset of a property, if the binding owns it.
    pub fn binding_offset(&self, id: BindingId, prop: &str) -> Option<f32> {
        self.bindings.iter().find(|b| b.id == id)?.offset(prop)
    }

    pub fn unbind_interaction(&mut self, id: BindingId) {
        self.bindings.retain(|b| b.id != id);
    }

    // ----- stored sections -----

    /// Mount a resolved stored-section blueprint: its entrance timeline, its
    /// ambient loops, and its trigger (wired to the timeline) in one call.
    pub fn mount_section(
        &mut self,
        section: SectionId,
        blueprint: SectionBlueprint,
    ) -> Result<MountedSection> {
        let timeline = self.add_timeline(section, blueprint.timeline)?;
        let mut loops = Vec::with_capacity(blueprint.loops.len());
        for spec in blueprint.loops {
            loops.push(self.start_tween(section, spec)?);
        }
        let trigger = match blueprint.trigger {
            Some(bt) => Some(self.register_trigger(section, bt.into_spec(timeline))?),
            None => None,
        };
        Ok(MountedSection {
            timeline,
            loops,
            trigger,
        })
    }

    // ----- teardown -----

    /// Tear down everything a section owns: tweens stop where they are (no
    /// completion callbacks), timelines and triggers disappear, bindings
    /// release their offsets, targets unregister. Safe to call repeatedly and
    /// safe to call mid-flight; the next `update` simply has less to do.
    pub fn release_section(&mut self, section: SectionId) {
        self.tweens.retain(|t| t.section != section);
        self.timelines.retain(|t| t.section != section);
        self.triggers.retain(|t| t.section != section);
        self.bindings.retain(|b| b.section != section);
        self.targets.retain(|_, reg| reg.section != section);
        let targets = &self.targets;
        self.committed.retain(|(target, _), _| targets.contains_key(target));
    }

    // ----- the frame -----

    /// Advance every schedule by `dt` seconds and apply the composed result.
    /// `dt` is wall-clock delta; a long pause simply fast-forwards clocks.
    pub fn update(&mut self, dt: f32, inputs: &Inputs) -> &Outputs {
        self.outputs.clear();
        self.accum.begin_frame();
        for event in self.pending.drain(..) {
            self.outputs.push_event(event);
        }

        if let Some(viewport) = inputs.viewport {
            self.viewport = Some(viewport);
        }

        self.evaluate_triggers();
        self.route_pointer(inputs);
        self.advance_tweens(dt);
        for timeline in &mut self.timelines {
            timeline.advance(dt, &mut self.accum, &mut self.outputs);
        }
        for binding in &mut self.bindings {
            binding.advance(dt, &mut self.accum);
        }
        self.apply_frame();
        self.tweens.retain(|t| !t.done);

        &self.outputs
    }

    /// Evaluate every trigger against the latest viewport snapshot. Runs at
    /// most once per frame by construction.
    fn evaluate_triggers(&mut self) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let Engine {
            triggers,
            timelines,
            targets,
            outputs,
            ..
        } = self;
        for trigger in triggers.iter_mut().filter(|t| !t.disabled) {
            let Some(reg) = targets.get(&trigger.spec.target) else {
                log::warn!(
                    "trigger {:?} lost target {:?}; disabling",
                    trigger.id,
                    trigger.spec.target
                );
                outputs.push_event(CoreEvent::TargetMissing {
                    target: trigger.spec.target,
                });
                trigger.disabled = true;
                continue;
            };
            let Some(direction) = trigger.evaluate(reg.surface.bounds(), viewport) else {
                continue;
            };
            let action = trigger.action_for(direction);
            let applied = match timelines.iter_mut().find(|t| t.id == trigger.spec.timeline) {
                Some(timeline) => match action {
                    ToggleAction::Play => timeline.play(),
                    ToggleAction::Reverse => timeline.reverse(),
                    ToggleAction::None => false,
                },
                None => false,
            };
            trigger.transition(direction, action);
            // A `None` crossing is reported as-is; a `Play`/`Reverse` crossing
            // is reported only when the timeline actually changed state.
            if applied || action == ToggleAction::None {
                outputs.push_event(CoreEvent::TriggerFired {
                    trigger: trigger.id,
                    direction,
                    action,
                });
            }
        }
    }

    /// Route pointer events to their bindings. Coordinates are document-space;
    /// the binding sees the offset from its target's center.
    fn route_pointer(&mut self, inputs: &Inputs) {
        let Engine {
            bindings,
            targets,
            outputs,
            ..
        } = self;
        for event in &inputs.pointer {
            for binding in bindings.iter_mut().filter(|b| b.target == event.target) {
                match event.kind {
                    PointerEventKind::Move { x, y } => {
                        let Some(reg) = targets.get(&event.target) else {
                            continue;
                        };
                        let center = reg.surface.bounds().center();
                        binding.on_move(x - center.0, y - center.1, outputs);
                    }
                    PointerEventKind::Leave => binding.on_leave(),
                }
            }
        }
    }

    fn advance_tweens(&mut self, dt: f32) {
        let Engine {
            tweens,
            accum,
            outputs,
            ..
        } = self;
        for tween in tweens.iter_mut() {
            tween.elapsed += dt;
            let p = tween.spec.cycle_progress(tween.elapsed);
            let mut first_value = None;
            for seg in &tween.spec.segments {
                let value = seg.sample(p, tween.spec.easing);
                first_value.get_or_insert(value);
                accum.push(tween.spec.target, &seg.prop, value, tween.spec.channel);
            }
            if let (Some(value), Some(cb)) = (first_value, tween.spec.on_update.as_mut()) {
                if let Err(message) = run_guarded("tween on_update", || cb(value)) {
                    outputs.push_event(CoreEvent::CallbackPanicked { message });
                    tween.done = true;
                    continue;
                }
            }
            if matches!(tween.spec.repeat, Repeat::Once) && tween.elapsed >= tween.spec.duration {
                if let Some(cb) = tween.spec.on_complete.take() {
                    if let Err(message) = run_guarded("tween on_complete", cb) {
                        outputs.push_event(CoreEvent::CallbackPanicked { message });
                    }
                }
                outputs.push_event(CoreEvent::TweenCompleted { tween: tween.id });
                tween.done = true;
            }
        }
    }

    /// Compose the frame and apply one batch per touched target. Batches for
    /// targets that disappeared mid-frame drop silently.
    fn apply_frame(&mut self) {
        let Engine {
            accum,
            committed,
            targets,
            outputs,
            ..
        } = self;
        for (target, batch) in accum.finalize(committed) {
            let Some(reg) = targets.get_mut(&target) else {
                log::debug!("dropping batch for missing target {target:?}");
                continue;
            };
            reg.surface.apply(&batch);
            for write in batch.iter() {
                outputs.push_change(Change {
                    target,
                    prop: write.prop.clone(),
                    value: write.value,
                });
            }
        }
    }
}

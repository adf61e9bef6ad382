//! Parse stored section JSON (see kinema-test-fixtures' `fixtures/sections/`)
//! into canonical section blueprints ready to mount on an engine.
//!
//! Notes:
//! - Durations are given in seconds and kept as seconds.
//! - Step positions use a compact string form: a bare number is an absolute
//!   start, `"<"`/`"<0.2"` schedules with the previous step's start,
//!   `">"`/`">0.3"` after the previous step's end, and `"+=d"`/`"-=d"` are
//!   shorthand for after-previous with a signed gap.
//! - Easings are named (`"power2.out"`, `"back.out(1.7)"`, ...); an unknown
//!   name fails the parse rather than silently falling back to linear.

use serde::Deserialize;

use crate::easing::Easing;
use crate::ids::TargetId;
use crate::timeline::{Offset, TimelineBuilder};
use crate::trigger::{ToggleAction, TriggerSpec};
use crate::tween::{Segment, TweenSpec};

/// Public API: parse stored-section JSON into canonical [`StoredSection`].
pub fn parse_stored_section_json(s: &str) -> Result<StoredSection, String> {
    let raw: RawSection = serde_json::from_str(s).map_err(|e| format!("parse error: {e}"))?;

    let mut steps: Vec<StoredStep> = Vec::with_capacity(raw.steps.len());
    for rs in raw.steps {
        if !(rs.duration.is_finite() && rs.duration > 0.0) {
            return Err(format!(
                "step on '{}': duration must be positive and finite, got {}",
                rs.element, rs.duration
            ));
        }
        let mut segments: Vec<StoredSegment> = Vec::with_capacity(rs.props.len());
        for rp in rs.props {
            if !(rp.from.is_finite() && rp.to.is_finite()) {
                return Err(format!(
                    "step on '{}': property '{}' has non-finite endpoints",
                    rs.element, rp.prop
                ));
            }
            segments.push(StoredSegment {
                prop: rp.prop,
                from: rp.from as f32,
                to: rp.to as f32,
            });
        }
        if segments.is_empty() {
            return Err(format!("step on '{}' animates no properties", rs.element));
        }
        steps.push(StoredStep {
            element: rs.element,
            segments,
            duration: rs.duration as f32,
            easing: parse_easing(rs.ease.as_deref())?,
            position: parse_position(rs.position.as_ref())?,
        });
    }

    let mut loops: Vec<StoredLoop> = Vec::with_capacity(raw.loops.len());
    for rl in raw.loops {
        if !(rl.duration.is_finite() && rl.duration > 0.0) {
            return Err(format!(
                "loop on '{}': duration must be positive and finite, got {}",
                rl.element, rl.duration
            ));
        }
        loops.push(StoredLoop {
            element: rl.element,
            prop: rl.prop,
            from: rl.from as f32,
            to: rl.to as f32,
            duration: rl.duration as f32,
            easing: parse_easing(rl.ease.as_deref())?,
            yoyo: rl.yoyo,
        });
    }

    let trigger = match raw.trigger {
        Some(rt) => Some(StoredTrigger {
            element: rt.element,
            threshold: parse_start(&rt.start)?,
            on_enter_forward: parse_action(rt.toggle_actions.as_deref(), 0)?,
            on_enter_backward: parse_action(rt.toggle_actions.as_deref(), 3)?,
        }),
        None => None,
    };

    Ok(StoredSection {
        name: raw.name,
        steps,
        loops,
        trigger,
    })
}

fn parse_easing(name: Option<&str>) -> Result<Easing, String> {
    match name {
        None => Ok(Easing::Linear),
        Some(n) => Easing::from_name(n).map_err(|e| e.to_string()),
    }
}

/// `"top 85%"` -> 0.85. Only top-edge starts are supported; reveal sections
/// anchor on the element top, not its center or bottom.
fn parse_start(start: &str) -> Result<f32, String> {
    let rest = start
        .strip_prefix("top")
        .ok_or_else(|| format!("unsupported trigger start: '{start}'"))?
        .trim();
    let pct = rest
        .strip_suffix('%')
        .ok_or_else(|| format!("unsupported trigger start: '{start}'"))?;
    let value: f32 = pct
        .trim()
        .parse()
        .map_err(|_| format!("unsupported trigger start: '{start}'"))?;
    Ok(value / 100.0)
}

/// Toggle-action strings hold four words (enter, leave, enter-back,
/// leave-back); only the first and last drive timeline state here.
fn parse_action(actions: Option<&str>, index: usize) -> Result<ToggleAction, String> {
    let default = ["play", "none", "none", "reverse"];
    let word = match actions {
        None => default[index],
        Some(s) => s
            .split_whitespace()
            .nth(index)
            .ok_or_else(|| format!("toggle actions need four words, got '{s}'"))?,
    };
    ToggleAction::from_name(word).map_err(|e| e.to_string())
}

fn parse_position(position: Option<&RawPosition>) -> Result<Offset, String> {
    let Some(position) = position else {
        return Ok(Offset::AfterPrev(0.0));
    };
    match position {
        RawPosition::Absolute(secs) => {
            if !(secs.is_finite() && *secs >= 0.0) {
                return Err(format!("absolute position must be >= 0, got {secs}"));
            }
            Ok(Offset::At(*secs as f32))
        }
        RawPosition::Tag(s) => parse_position_tag(s),
    }
}

fn parse_position_tag(s: &str) -> Result<Offset, String> {
    let parse_gap = |g: &str, what: &str| -> Result<f32, String> {
        if g.is_empty() {
            return Ok(0.0);
        }
        g.parse::<f32>()
            .map_err(|_| format!("bad {what} position: '{s}'"))
    };
    if let Some(rest) = s.strip_prefix("-=") {
        return Ok(Offset::AfterPrev(-parse_gap(rest, "relative")?));
    }
    if let Some(rest) = s.strip_prefix("+=") {
        return Ok(Offset::AfterPrev(parse_gap(rest, "relative")?));
    }
    if let Some(rest) = s.strip_prefix('<') {
        return Ok(Offset::WithPrev(parse_gap(rest, "with-previous")?));
    }
    if let Some(rest) = s.strip_prefix('>') {
        return Ok(Offset::AfterPrev(parse_gap(rest, "after-previous")?));
    }
    Err(format!("unrecognized position: '{s}'"))
}

// ----- Canonical section shapes -----

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSection {
    pub name: String,
    pub steps: Vec<StoredStep>,
    pub loops: Vec<StoredLoop>,
    pub trigger: Option<StoredTrigger>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredStep {
    pub element: String,
    pub segments: Vec<StoredSegment>,
    pub duration: f32,
    pub easing: Easing,
    pub position: Offset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSegment {
    pub prop: String,
    pub from: f32,
    pub to: f32,
}

/// Ambient loop (float, breathe) running off its own clock once mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLoop {
    pub element: String,
    pub prop: String,
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub easing: Easing,
    pub yoyo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrigger {
    pub element: String,
    pub threshold: f32,
    pub on_enter_forward: ToggleAction,
    pub on_enter_backward: ToggleAction,
}

/// Everything needed to mount a parsed section on an engine: the entrance
/// timeline, ambient loop tweens, and the viewport trigger (if any), with
/// element names already resolved to target ids.
pub struct SectionBlueprint {
    pub timeline: TimelineBuilder,
    pub loops: Vec<TweenSpec>,
    pub trigger: Option<BlueprintTrigger>,
}

pub struct BlueprintTrigger {
    pub target: TargetId,
    pub threshold: f32,
    pub on_enter_forward: ToggleAction,
    pub on_enter_backward: ToggleAction,
}

impl StoredSection {
    /// Resolve element names against live targets and produce the mountable
    /// blueprint. An unresolvable name fails the whole section rather than
    /// mounting it partially.
    pub fn resolve(
        &self,
        mut lookup: impl FnMut(&str) -> Option<TargetId>,
    ) -> Result<SectionBlueprint, String> {
        let mut resolve = |element: &str| -> Result<TargetId, String> {
            lookup(element).ok_or_else(|| format!("unknown element: '{element}'"))
        };

        let mut timeline = TimelineBuilder::new();
        for step in &self.steps {
            let target = resolve(&step.element)?;
            let segments = step
                .segments
                .iter()
                .map(|s| Segment::new(s.prop.clone(), s.from, s.to))
                .collect();
            let spec = TweenSpec::multi(target, segments, step.duration).easing(step.easing);
            timeline = timeline.add(spec, step.position);
        }

        let mut loops = Vec::with_capacity(self.loops.len());
        for lp in &self.loops {
            let target = resolve(&lp.element)?;
            let spec = TweenSpec::new(target, lp.prop.clone(), lp.from, lp.to, lp.duration)
                .easing(lp.easing);
            loops.push(if lp.yoyo {
                spec.repeat_yoyo()
            } else {
                spec.repeat_restart()
            });
        }

        let trigger = match &self.trigger {
            Some(t) => Some(BlueprintTrigger {
                target: resolve(&t.element)?,
                threshold: t.threshold,
                on_enter_forward: t.on_enter_forward,
                on_enter_backward: t.on_enter_backward,
            }),
            None => None,
        };

        Ok(SectionBlueprint {
            timeline,
            loops,
            trigger,
        })
    }
}

impl BlueprintTrigger {
    pub(crate) fn into_spec(self, timeline: crate::ids::TimelineId) -> TriggerSpec {
        TriggerSpec {
            target: self.target,
            threshold: self.threshold,
            on_enter_forward: self.on_enter_forward,
            on_enter_backward: self.on_enter_backward,
            timeline,
        }
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawSection {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<RawStep>,
    #[serde(default)]
    pub loops: Vec<RawLoop>,
    #[serde(default)]
    pub trigger: Option<RawTrigger>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    pub element: String,
    pub props: Vec<RawProp>,
    pub duration: f64,
    #[serde(default)]
    pub ease: Option<String>,
    #[serde(default)]
    pub position: Option<RawPosition>,
}

#[derive(Debug, Deserialize)]
struct RawProp {
    pub prop: String,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Deserialize)]
struct RawLoop {
    pub element: String,
    pub prop: String,
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    #[serde(default)]
    pub ease: Option<String>,
    #[serde(default = "default_yoyo")]
    pub yoyo: bool,
}

fn default_yoyo() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawTrigger {
    pub element: String,
    pub start: String,
    #[serde(rename = "toggleActions")]
    #[serde(default)]
    pub toggle_actions: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Absolute(f64),
    Tag(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_forms() {
        assert_eq!(parse_position_tag("<"), Ok(Offset::WithPrev(0.0)));
        assert_eq!(parse_position_tag("<0.2"), Ok(Offset::WithPrev(0.2)));
        assert_eq!(parse_position_tag(">"), Ok(Offset::AfterPrev(0.0)));
        assert_eq!(parse_position_tag("-=0.4"), Ok(Offset::AfterPrev(-0.4)));
        assert_eq!(parse_position_tag("+=0.1"), Ok(Offset::AfterPrev(0.1)));
        assert!(parse_position_tag("sideways").is_err());
    }

    #[test]
    fn start_string_maps_to_threshold() {
        assert_eq!(parse_start("top 85%"), Ok(0.85));
        assert_eq!(parse_start("top 100%"), Ok(1.0));
        assert!(parse_start("center 50%").is_err());
    }

    #[test]
    fn toggle_actions_default_to_play_reverse() {
        assert_eq!(parse_action(None, 0), Ok(ToggleAction::Play));
        assert_eq!(parse_action(None, 3), Ok(ToggleAction::Reverse));
        assert_eq!(
            parse_action(Some("play none none none"), 3),
            Ok(ToggleAction::None)
        );
        assert!(parse_action(Some("play none"), 3).is_err());
    }

    #[test]
    fn rejects_unknown_easing() {
        let json = r#"{
            "name": "bad",
            "steps": [{
                "element": "title",
                "props": [{ "prop": "opacity", "from": 0, "to": 1 }],
                "duration": 1.0,
                "ease": "bounce.inSideways"
            }]
        }"#;
        assert!(parse_stored_section_json(json).is_err());
    }

    #[test]
    fn parses_full_section() {
        let json = r#"{
            "name": "hero",
            "steps": [
                {
                    "element": "title",
                    "props": [
                        { "prop": "opacity", "from": 0, "to": 1 },
                        { "prop": "y", "from": 60, "to": 0 }
                    ],
                    "duration": 1.0,
                    "ease": "power3.out"
                },
                {
                    "element": "subtitle",
                    "props": [{ "prop": "opacity", "from": 0, "to": 1 }],
                    "duration": 0.8,
                    "ease": "power2.out",
                    "position": "-=0.4"
                }
            ],
            "loops": [
                {
                    "element": "orb",
                    "prop": "y",
                    "from": 0,
                    "to": -18,
                    "duration": 3.0,
                    "ease": "sine.inOut"
                }
            ],
            "trigger": {
                "element": "root",
                "start": "top 85%",
                "toggleActions": "play none none reverse"
            }
        }"#;
        let section = parse_stored_section_json(json).unwrap();
        assert_eq!(section.name, "hero");
        assert_eq!(section.steps.len(), 2);
        assert_eq!(section.steps[0].position, Offset::AfterPrev(0.0));
        assert_eq!(section.steps[1].position, Offset::AfterPrev(-0.4));
        assert_eq!(section.loops.len(), 1);
        assert!(section.loops[0].yoyo);
        let trigger = section.trigger.as_ref().unwrap();
        assert_eq!(trigger.threshold, 0.85);
        assert_eq!(trigger.on_enter_backward, ToggleAction::Reverse);
    }
}

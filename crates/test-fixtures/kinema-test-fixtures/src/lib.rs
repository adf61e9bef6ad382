//! Shared fixtures for kinema tests: stored section JSON documents plus a
//! recording target surface that keeps a probe handle on the outside of the
//! engine.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use kinema_core::{AnimationTarget, PropertyBatch, Rect};

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    sections: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod sections {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.sections.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.sections, "section", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.sections, "section", name)?;
        let text = read_to_string(rel)?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.sections, "section", name)?;
        Ok(resolve_path(rel))
    }
}

#[derive(Debug, Default)]
struct RecordingInner {
    props: HashMap<String, f32>,
    bounds: Rect,
    batches: Vec<PropertyBatch>,
}

/// An animation target that records everything applied to it. Tests hand the
/// surface to the engine boxed and keep a [`RecordingProbe`] to read state
/// back out.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    inner: Rc<RefCell<RecordingInner>>,
}

/// Shared read handle onto a [`RecordingSurface`].
#[derive(Clone, Debug)]
pub struct RecordingProbe {
    inner: Rc<RefCell<RecordingInner>>,
}

impl RecordingSurface {
    pub fn new(bounds: Rect) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RecordingInner {
                bounds,
                ..Default::default()
            })),
        }
    }

    /// Seed initial property values; tweens validate against these at start.
    pub fn with_props(self, props: &[(&str, f32)]) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            for (prop, value) in props {
                inner.props.insert((*prop).to_string(), *value);
            }
        }
        self
    }

    pub fn probe(&self) -> RecordingProbe {
        RecordingProbe {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl AnimationTarget for RecordingSurface {
    fn get(&self, prop: &str) -> Option<f32> {
        self.inner.borrow().props.get(prop).copied()
    }

    fn apply(&mut self, batch: &PropertyBatch) {
        let mut inner = self.inner.borrow_mut();
        for write in batch.iter() {
            inner.props.insert(write.prop.clone(), write.value);
        }
        inner.batches.push(batch.clone());
    }

    fn bounds(&self) -> Rect {
        self.inner.borrow().bounds
    }
}

impl RecordingProbe {
    pub fn value(&self, prop: &str) -> Option<f32> {
        self.inner.borrow().props.get(prop).copied()
    }

    pub fn batch_count(&self) -> usize {
        self.inner.borrow().batches.len()
    }

    pub fn last_batch(&self) -> Option<PropertyBatch> {
        self.inner.borrow().batches.last().cloned()
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.inner.borrow_mut().bounds = bounds;
    }
}

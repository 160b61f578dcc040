use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::viewport::Bounds;

/// A named viewpoint a tour passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub bounds: Bounds,
    /// 1-based position in the tour.
    pub frame_number: u32,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Keyframes kept sorted by frame number.
#[derive(Debug, Clone, Default)]
pub struct KeyframeStore {
    frames: Vec<Keyframe>,
    next_id: u64,
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing list (e.g. loaded from disk). Entries are ordered by
    /// frame number and ids stay unique for future additions.
    pub fn from_keyframes(mut frames: Vec<Keyframe>) -> Self {
        frames.sort_by_key(|k| k.frame_number);
        let next_id = frames.iter().map(|k| k.id + 1).max().unwrap_or(0);
        Self { frames, next_id }
    }

    /// Lowest frame number `>= 1` not used by any keyframe.
    fn free_frame_number(&self) -> u32 {
        (1..)
            .find(|n| !self.frames.iter().any(|k| k.frame_number == *n))
            .unwrap_or(1)
    }

    /// Insert a keyframe for `bounds`; returns its id.
    pub fn add(&mut self, name: Option<&str>, bounds: Bounds) -> u64 {
        let frame_number = self.free_frame_number();
        let id = self.next_id;
        self.next_id += 1;

        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Keyframe {frame_number}"),
        };
        let keyframe = Keyframe {
            id,
            name,
            bounds,
            frame_number,
            created_at: unix_now(),
        };
        let at = self
            .frames
            .partition_point(|k| k.frame_number < frame_number);
        self.frames.insert(at, keyframe);
        id
    }

    /// Delete a keyframe and renumber the rest `1..=N` in order.
    pub fn remove(&mut self, id: u64) -> crate::Result<Keyframe> {
        let at = self.position(id)?;
        let removed = self.frames.remove(at);
        for (i, k) in self.frames.iter_mut().enumerate() {
            k.frame_number = i as u32 + 1;
        }
        Ok(removed)
    }

    pub fn rename(&mut self, id: u64, name: &str) -> crate::Result<()> {
        let at = self.position(id)?;
        let old = &self.frames[at];
        self.frames[at] = Keyframe {
            name: name.trim().to_string(),
            ..old.clone()
        };
        Ok(())
    }

    fn position(&self, id: u64) -> crate::Result<usize> {
        self.frames
            .iter()
            .position(|k| k.id == id)
            .ok_or(CoreError::UnknownKeyframe(id))
    }

    pub fn get(&self, id: u64) -> Option<&Keyframe> {
        self.frames.iter().find(|k| k.id == id)
    }

    pub fn as_slice(&self) -> &[Keyframe] {
        &self.frames
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.frames.iter()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.frames.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

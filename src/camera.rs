//! Camera switching
//!
//! Camera change records carry the target index as text in their `name`
//! field. The first record with a non-empty name wins; exactly one camera is
//! active after a switch.

use crate::api::ActionRecord;
use crate::{Error, Result};

/// Set of cameras that can be toggled on and off
pub trait CameraRig {
    fn camera_count(&self) -> usize;

    fn set_active(&mut self, index: usize, active: bool);
}

/// Find the camera index requested by a camera change batch
///
/// Scans for the first record whose `name` is non-empty and parses it.
/// Returns `Ok(None)` if no record names a camera.
///
/// # Errors
///
/// Returns `Error::Camera` if the first non-empty name is not an integer
pub fn requested_camera(records: &[ActionRecord]) -> Result<Option<i32>> {
    let Some(name) = records.iter().find_map(ActionRecord::camera_name) else {
        return Ok(None);
    };

    name.parse()
        .map(Some)
        .map_err(|e| Error::Camera(format!("invalid camera index {name:?}: {e}")))
}

/// Activates one camera of a rig at a time
#[derive(Debug)]
pub struct CameraSwitcher<R> {
    rig: R,
    active: Option<usize>,
}

impl<R: CameraRig> CameraSwitcher<R> {
    #[must_use]
    pub const fn new(rig: R) -> Self {
        Self { rig, active: None }
    }

    /// Activate camera `index` and deactivate every other camera
    ///
    /// # Errors
    ///
    /// Returns `Error::Camera` if the index is negative or out of range;
    /// the rig is left untouched
    pub fn switch_to(&mut self, index: i32) -> Result<usize> {
        let count = self.rig.camera_count();
        let target = usize::try_from(index)
            .ok()
            .filter(|i| *i < count)
            .ok_or_else(|| Error::Camera(format!("camera {index} out of range (0..{count})")))?;

        for i in 0..count {
            self.rig.set_active(i, i == target);
        }
        self.active = Some(target);

        tracing::info!(camera = target, "switched camera");
        Ok(target)
    }

    #[must_use]
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    #[must_use]
    pub const fn rig(&self) -> &R {
        &self.rig
    }
}

/// Named cameras without a renderer
#[derive(Debug, Clone, Default)]
pub struct HeadlessCameras {
    names: Vec<String>,
    active: Vec<bool>,
}

impl HeadlessCameras {
    /// Create a rig with the given cameras, the first one active
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let active = (0..names.len()).map(|i| i == 0).collect();
        Self { names, active }
    }

    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Name of the single active camera, if exactly one is active
    #[must_use]
    pub fn active_name(&self) -> Option<&str> {
        let mut active = self
            .names
            .iter()
            .zip(&self.active)
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str());

        match (active.next(), active.next()) {
            (Some(name), None) => Some(name),
            _ => None,
        }
    }
}

impl CameraRig for HeadlessCameras {
    fn camera_count(&self) -> usize {
        self.names.len()
    }

    fn set_active(&mut self, index: usize, active: bool) {
        if let Some(slot) = self.active.get_mut(index) {
            if *slot != active {
                tracing::debug!(camera = %self.names[index], active, "camera toggled");
            }
            *slot = active;
        }
    }
}

use iso_garden_catalog::Catalog;

use crate::{plan_frame, FramePlan, Scene};

/// Caches the most recent frame plan between repaints.
///
/// A plan is rebuilt only when the caller reports a change, so idle frames
/// reuse the previous layout.
#[derive(Debug, Default)]
pub struct RenderLoop {
    plan: FramePlan,
    planned: bool,
    planned_frames: u64,
    reused_frames: u64,
}

impl RenderLoop {
    /// Creates a loop that plans on its first refresh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the plan when `dirty` is set or nothing was planned yet.
    ///
    /// `scene` is only invoked when a new plan is needed. Returns whether the
    /// plan changed.
    pub fn refresh<S>(&mut self, dirty: bool, scene: S, catalog: &Catalog) -> bool
    where
        S: FnOnce() -> Scene,
    {
        if dirty || !self.planned {
            self.plan = plan_frame(&scene(), catalog);
            self.planned = true;
            self.planned_frames += 1;
            true
        } else {
            self.reused_frames += 1;
            false
        }
    }

    /// Plan painted by the backend.
    #[must_use]
    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    /// Number of refreshes that rebuilt the plan.
    #[must_use]
    pub fn planned_frames(&self) -> u64 {
        self.planned_frames
    }

    /// Number of refreshes that kept the previous plan.
    #[must_use]
    pub fn reused_frames(&self) -> u64 {
        self.reused_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso_garden_core::{Camera, Viewport};

    fn scene() -> Scene {
        Scene::new(Camera::default(), Viewport::new(200.0, 100.0))
    }

    #[test]
    fn first_refresh_always_plans() {
        let mut frames = RenderLoop::new();
        assert!(frames.plan().is_empty());
        assert!(frames.refresh(false, scene, &Catalog::builtin()));
        assert!(!frames.plan().is_empty());
    }

    #[test]
    fn clean_frames_skip_scene_construction() {
        let catalog = Catalog::builtin();
        let mut frames = RenderLoop::new();
        let _ = frames.refresh(true, scene, &catalog);

        let changed = frames.refresh(false, || panic!("scene built for a clean frame"), &catalog);
        assert!(!changed);
        assert!(frames.refresh(true, scene, &catalog));
        assert_eq!(frames.planned_frames(), 2);
        assert_eq!(frames.reused_frames(), 1);
    }
}

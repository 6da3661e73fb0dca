//! The ordered list of views captured in one run.
//!
//! A plan is pure data: building it touches neither the host nor the camera.
//! The seven presets always come first and in a fixed order, followed by the
//! requested number of random views.

use nalgebra::Vector3;
use parse_display::{Display, FromStr};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::ConfigError,
    orientation::{sample_uniform_angle, sample_uniform_unit_vector, Direction},
};

/// The number of random views captured when nothing else is configured.
pub const DEFAULT_RANDOM_VIEWS: usize = 10;

/// The most random views one plan may hold.
pub const MAX_RANDOM_VIEWS: usize = 10_000;

/// One of the fixed named viewpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromStr, Display)]
#[display(style = "lowercase")]
pub enum PresetView {
    Isometric,
    Top,
    Bottom,
    Front,
    Rear,
    Right,
    Left,
}

impl PresetView {
    /// Every preset, in capture order.
    pub const ALL: [PresetView; 7] = [
        PresetView::Isometric,
        PresetView::Top,
        PresetView::Bottom,
        PresetView::Front,
        PresetView::Rear,
        PresetView::Right,
        PresetView::Left,
    ];

    /// The direction the camera is turned toward, or `None` for the
    /// isometric view, whose framing is left to the host.
    pub fn target(self) -> Option<Direction> {
        match self {
            PresetView::Isometric => None,
            PresetView::Top => Some(Vector3::new(0.0, 0.0, 1.0)),
            PresetView::Bottom => Some(Vector3::new(0.0, 0.0, -1.0)),
            PresetView::Front => Some(Vector3::new(0.0, -1.0, 0.0)),
            PresetView::Rear => Some(Vector3::new(0.0, 1.0, 0.0)),
            PresetView::Right => Some(Vector3::new(1.0, 0.0, 0.0)),
            PresetView::Left => Some(Vector3::new(-1.0, 0.0, 0.0)),
        }
    }
}

/// A randomly oriented view.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomView {
    /// 1-based position among the random views of the plan.
    pub index: usize,
    /// Unit rotation axis.
    pub axis: Direction,
    /// Rotation about `axis`, in radians within `[0, 2π)`.
    pub angle: f64,
}

impl RandomView {
    /// The angle in whole degrees, truncated toward zero.
    pub fn angle_degrees(&self) -> i64 {
        self.angle.to_degrees().trunc() as i64
    }
}

/// One viewpoint to capture.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewSpec {
    Preset(PresetView),
    Random(RandomView),
}

impl ViewSpec {
    /// A short human readable name, e.g. `front` or `random_view_3`.
    pub fn label(&self) -> String {
        match self {
            ViewSpec::Preset(preset) => preset.to_string(),
            ViewSpec::Random(view) => format!("random_view_{}", view.index),
        }
    }
}

/// What goes into a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConfig {
    pub random_views: usize,
    /// Seeds the random views; `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            random_views: DEFAULT_RANDOM_VIEWS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewPlan {
    views: Vec<ViewSpec>,
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.random_views > MAX_RANDOM_VIEWS {
            return Err(ConfigError::invalid_value(
                "random_views",
                self.random_views,
                format!("must be at most {MAX_RANDOM_VIEWS}"),
            ));
        }
        Ok(())
    }
}

impl ViewPlan {
    pub fn build(config: &PlanConfig) -> Result<ViewPlan, ConfigError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(ViewPlan::build_with_rng(config.random_views, &mut rng))
    }

    fn build_with_rng<R: Rng + ?Sized>(random_views: usize, rng: &mut R) -> ViewPlan {
        let mut views = Vec::with_capacity(PresetView::ALL.len() + random_views);
        views.extend(PresetView::ALL.into_iter().map(ViewSpec::Preset));

        for index in 1..=random_views {
            let axis = sample_uniform_unit_vector(rng);
            let angle = sample_uniform_angle(rng);
            views.push(ViewSpec::Random(RandomView { index, axis, angle }));
        }

        ViewPlan { views }
    }

    #[cfg(test)]
    pub(crate) fn from_views(views: Vec<ViewSpec>) -> ViewPlan {
        ViewPlan { views }
    }

    pub fn views(&self) -> &[ViewSpec] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ViewSpec> {
        self.views.iter()
    }
}

impl<'a> IntoIterator for &'a ViewPlan {
    type Item = &'a ViewSpec;
    type IntoIter = std::slice::Iter<'a, ViewSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

//! Output file names for captured views.
//!
//! Preset views are named after their label. Random views encode their 1-based
//! index, their axis rounded to two decimals and their angle in whole degrees,
//! e.g. `random_view_3_axis_0.41_-0.22_0.88_angle_145.png`.
//!
//! The index alone keeps names unique within a run. The rounding only affects
//! the name; the orientation applied to the camera uses the exact axis.

use std::path::{Path, PathBuf};

use crate::{types::ImageFormat, view_plan::ViewSpec};

/// The file name (no directory) a view is written to.
pub fn file_name(view: &ViewSpec, format: ImageFormat) -> String {
    let ext = format.extension();
    match view {
        ViewSpec::Preset(preset) => format!("{preset}.{ext}"),
        ViewSpec::Random(random) => format!(
            "random_view_{}_axis_{:.2}_{:.2}_{:.2}_angle_{}.{ext}",
            random.index,
            random.axis.x,
            random.axis.y,
            random.axis.z,
            random.angle_degrees(),
        ),
    }
}

/// Where in `output_dir` a view is written.
pub fn path_for(output_dir: &Path, view: &ViewSpec, format: ImageFormat) -> PathBuf {
    output_dir.join(file_name(view, format))
}

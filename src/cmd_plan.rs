use anyhow::Result;
use clap::Parser;

use crate::{
    naming,
    types::{FormatOutput, ImageFormat},
    view_plan::{PlanConfig, ViewPlan, ViewSpec},
};

/// Print the views a render would capture, without rendering anything.
///
///     $ multiview plan
///
///     # the same random views `render --seed 7` would use
///     $ multiview plan --seed 7 --format json
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdPlan {
    /// Number of random views after the presets.
    #[clap(short = 'n', long)]
    pub random_views: Option<usize>,

    /// Seed for the random views.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Encoding the file names are given for.
    #[clap(short = 't', long, value_enum)]
    pub image_format: Option<ImageFormat>,

    /// Command output format.
    #[clap(long, short, value_enum)]
    pub format: Option<FormatOutput>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, tabled::Tabled)]
pub struct PlanRow {
    pub view: String,
    /// The direction a preset looks along, or the rotation axis of a random view.
    pub direction: String,
    pub angle: String,
    pub file: String,
}

impl PlanRow {
    fn new(view: &ViewSpec, image_format: ImageFormat) -> Self {
        let fmt = |v: &nalgebra::Vector3<f64>| format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z);
        let (direction, angle) = match view {
            ViewSpec::Preset(preset) => (
                preset.target().map(|target| fmt(&target)).unwrap_or_else(|| "host isometric".to_string()),
                String::new(),
            ),
            ViewSpec::Random(random) => (fmt(&random.axis), format!("{:.2}°", random.angle.to_degrees())),
        };
        PlanRow {
            view: view.label(),
            direction,
            angle,
            file: naming::file_name(view, image_format),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdPlan {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        let image_format = ctx.setting(self.image_format, "image_format")?;
        let plan = ViewPlan::build(&PlanConfig {
            random_views: ctx.setting(self.random_views, "random_views")?,
            seed: self.seed,
        })?;

        let rows: Vec<PlanRow> = plan.iter().map(|view| PlanRow::new(view, image_format)).collect();
        let format = ctx.format(&self.format)?;
        ctx.io.write_output_for_vec(&format, &rows)?;
        Ok(())
    }
}

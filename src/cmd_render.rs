use std::{path::PathBuf, sync::atomic::Ordering, time::Duration};

use anyhow::{bail, Context as _, Result};
use clap::Parser;

use crate::{
    capture::{CancelFlag, CaptureOrchestrator, CaptureReport, CaptureResult, CaptureSettings},
    error::ConfigError,
    host::{preview::PreviewHost, HostApplication},
    loader::{detect_format, document_name, loader_for},
    types::{Background, FormatOutput, ImageFormat, ModelFormat},
    view_plan::{PlanConfig, ViewPlan},
};

/// Render a model from seven preset views and a set of random views.
///
///     # presets plus ten random views, as png
///     $ multiview render bracket.stl renders/
///
///     # reproducible random views, as jpeg on black
///     $ multiview render bracket.stl renders/ --seed 7 -t jpeg --background black
///
///     # presets only
///     $ multiview render bracket.stl renders/ --random-views 0
///
/// Views are captured one at a time in a fixed order: isometric, top, bottom,
/// front, rear, right, left, then the random views. Each one is written to
/// `<output-dir>/<view>.<ext>`. A view that fails to export is reported and the
/// remaining views are still captured; the command then exits non-zero.
///
/// Press Ctrl-C to stop after the view in progress.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdRender {
    /// The path to the model to render.
    #[clap(name = "input", required = true)]
    pub input: PathBuf,

    /// The directory to write the images to. Created if missing.
    #[clap(name = "output-dir", required = true)]
    pub output_dir: PathBuf,

    /// How to import the model. Inferred from the file extension if not set.
    #[clap(long, value_enum)]
    pub src_format: Option<ModelFormat>,

    /// Width of each image in pixels.
    #[clap(long)]
    pub width: Option<u32>,

    /// Height of each image in pixels.
    #[clap(long)]
    pub height: Option<u32>,

    /// Fill color behind the model: white, black, transparent or #rrggbb.
    #[clap(long)]
    pub background: Option<Background>,

    /// Factor applied to the initial camera position. Must be greater than 1.0.
    #[clap(long)]
    pub distance_scale: Option<f64>,

    /// Milliseconds to wait for a redraw when the host gives no completion signal.
    #[clap(long)]
    pub settle_delay_ms: Option<u64>,

    /// Milliseconds to wait for the host to confirm a redraw before capturing anyway.
    #[clap(long)]
    pub settle_timeout_ms: Option<u64>,

    /// Number of random views after the presets.
    #[clap(short = 'n', long)]
    pub random_views: Option<usize>,

    /// Seed for the random views. Omit for a different set every run.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Encoding of the images.
    #[clap(short = 't', long, value_enum)]
    pub image_format: Option<ImageFormat>,

    /// Command output format.
    #[clap(long, short, value_enum)]
    pub format: Option<FormatOutput>,
}

/// One line of the end-of-run summary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, tabled::Tabled)]
pub struct CaptureRow {
    pub view: String,
    pub file: String,
    pub status: String,
    pub note: String,
}

impl From<&CaptureResult> for CaptureRow {
    fn from(result: &CaptureResult) -> Self {
        let note = match (&result.error, result.settle_warning) {
            (Some(err), _) => err.to_string(),
            (None, true) => "frame not confirmed by host".to_string(),
            (None, false) => String::new(),
        };
        CaptureRow {
            view: result.view.label(),
            file: result.output_path.display().to_string(),
            status: if result.succeeded() { "ok" } else { "failed" }.to_string(),
            note,
        }
    }
}

impl CmdRender {
    fn settings(&self, ctx: &crate::context::Context) -> Result<CaptureSettings> {
        let settings = CaptureSettings {
            width: ctx.setting(self.width, "image_width")?,
            height: ctx.setting(self.height, "image_height")?,
            background: ctx.setting(self.background, "background")?,
            image_format: ctx.setting(self.image_format, "image_format")?,
            distance_scale: ctx.setting(self.distance_scale, "distance_scale")?,
            settle_delay: Duration::from_millis(ctx.setting(self.settle_delay_ms, "settle_delay_ms")?),
            settle_timeout: Duration::from_millis(ctx.setting(self.settle_timeout_ms, "settle_timeout_ms")?),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn model_format(&self) -> Result<ModelFormat, ConfigError> {
        if !self.input.is_file() {
            return Err(ConfigError::MissingInput(self.input.clone()));
        }
        match self.src_format {
            Some(format) => Ok(format),
            None => detect_format(&self.input),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdRender {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        let model_format = self.model_format()?;
        let settings = self.settings(ctx)?;
        let format = ctx.format(&self.format)?;
        let plan = ViewPlan::build(&PlanConfig {
            random_views: ctx.setting(self.random_views, "random_views")?,
            seed: self.seed,
        })?;

        let mut host = PreviewHost;
        let mut document = host.new_document(&document_name(&self.input, model_format))?;
        let loader = loader_for(model_format);
        log::info!("loading `{}` as {}", self.input.display(), loader.format());
        loader
            .load(&self.input, document.as_mut())
            .with_context(|| format!("failed to load `{}`", self.input.display()))?;

        let cancel = CancelFlag::default();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.store(true, Ordering::SeqCst);
                }
            })
        };

        let cs = ctx.io.color_scheme();
        let show_progress = ctx.io.is_stderr_tty();
        let total = plan.len();
        let mut progress_err = None;
        let err_out = &mut ctx.io.err_out;

        let report = CaptureOrchestrator::new(document.active_viewport(), settings)?
            .with_cancel_flag(cancel)
            .run(&plan, &self.output_dir, |position, result| {
                if !show_progress || progress_err.is_some() {
                    return;
                }
                let icon = match (result.succeeded(), result.settle_warning) {
                    (false, _) => cs.failure_icon(),
                    (true, true) => cs.warning_icon(),
                    (true, false) => cs.success_icon(),
                };
                if let Err(err) = writeln!(
                    err_out,
                    "{icon} [{}/{total}] {}",
                    position + 1,
                    cs.cyan(&result.output_path.display().to_string())
                ) {
                    progress_err = Some(err);
                }
            })
            .await;
        ctrl_c.abort();

        let report = report?;
        if let Some(err) = progress_err {
            return Err(err.into());
        }

        self.print_report(ctx, &format, &report, total)
    }
}

impl CmdRender {
    fn print_report(
        &self,
        ctx: &mut crate::context::Context,
        format: &FormatOutput,
        report: &CaptureReport,
        total: usize,
    ) -> Result<()> {
        let rows: Vec<CaptureRow> = report.results.iter().map(CaptureRow::from).collect();
        ctx.io.write_output_for_vec(format, &rows)?;

        if report.cancelled {
            bail!("capture cancelled after {} of {total} views", report.results.len());
        }
        if report.failed() > 0 {
            bail!("{} of {total} views failed to capture", report.failed());
        }

        if *format == FormatOutput::Table {
            let cs = ctx.io.color_scheme();
            writeln!(
                ctx.io.out,
                "{} Captured {total} views to `{}`",
                cs.success_icon(),
                self.output_dir.display()
            )?;
        }
        Ok(())
    }
}

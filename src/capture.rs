//! Drives a host viewport through every view of a plan.
//!
//! Views are captured strictly one after another, in plan order. Each view
//! sets the camera orientation absolutely, asks the host to frame the model,
//! waits for a settled frame and exports it. A failed export is recorded on
//! that view's result and the run carries on; malformed geometry or an
//! unusable output directory aborts the run before anything is captured.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, warn};
use nalgebra::Point3;

use crate::{
    error::{CaptureError, ConfigError, GeometryError},
    host::{ExportOptions, FrameSignal, HostError, Viewport},
    naming,
    orientation::{axis_angle_orientation, camera_forward, rotation_aligning, Orientation},
    types::{Background, ImageFormat},
    view_plan::{ViewPlan, ViewSpec},
};

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 768;
pub const DEFAULT_DISTANCE_SCALE: f64 = 1.8;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Set to `true` to stop a run before its next view.
pub type CancelFlag = Arc<AtomicBool>;

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub image_format: ImageFormat,
    /// Factor applied to the initial camera position to pull it away from the model.
    pub distance_scale: f64,
    /// How long to wait after a redraw when the host cannot confirm it finished.
    pub settle_delay: Duration,
    /// Upper bound on waiting for the host to confirm a redraw.
    pub settle_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: Background::default(),
            image_format: ImageFormat::default(),
            distance_scale: DEFAULT_DISTANCE_SCALE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

impl CaptureSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::invalid_value("image_width", self.width, "must be positive"));
        }
        if self.height == 0 {
            return Err(ConfigError::invalid_value("image_height", self.height, "must be positive"));
        }
        if !(self.distance_scale.is_finite() && self.distance_scale > 1.0) {
            return Err(ConfigError::invalid_value(
                "distance_scale",
                self.distance_scale,
                "must be greater than 1.0",
            ));
        }
        Ok(())
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            width: self.width,
            height: self.height,
            background: self.background,
            format: self.image_format,
        }
    }
}

/// How the viewport was judged ready before a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    /// The host confirmed the frame.
    Confirmed,
    /// The host has no confirmation; the fixed delay was waited out.
    Delayed,
    /// The host never answered within the timeout.
    TimedOut,
}

/// The outcome of capturing one view.
#[derive(Debug)]
pub struct CaptureResult {
    pub view: ViewSpec,
    pub output_path: PathBuf,
    pub error: Option<HostError>,
    /// The host did not confirm the frame in time; it was captured anyway.
    pub settle_warning: bool,
}

impl CaptureResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a run produced, in capture order.
#[derive(Debug, Default)]
pub struct CaptureReport {
    pub results: Vec<CaptureResult>,
    /// The run stopped early; views after the last result were never attempted.
    pub cancelled: bool,
}

impl CaptureReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Every planned view was captured.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed() == 0
    }
}

/// The rotation to apply for `view`, or `None` when the host's own isometric
/// view is used instead.
pub fn resolve_orientation(view: &ViewSpec) -> Result<Option<Orientation>, GeometryError> {
    match view {
        ViewSpec::Preset(preset) => preset
            .target()
            .map(|target| rotation_aligning(&camera_forward(), &target))
            .transpose(),
        ViewSpec::Random(random) => axis_angle_orientation(&random.axis, random.angle).map(Some),
    }
}

/// Scale every component of `position`, moving it away from the origin.
pub fn scale_position(position: &Point3<f64>, scale: f64) -> Point3<f64> {
    Point3::from(position.coords * scale)
}

/// Create the output directory if needed and make sure files can be written to it.
pub fn prepare_output_dir(dir: &Path) -> Result<(), ConfigError> {
    if dir.exists() && !dir.is_dir() {
        return Err(ConfigError::OutputNotDirectory(dir.to_path_buf()));
    }
    let output_dir_err = |source| ConfigError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(output_dir_err)?;

    let check = dir.join(format!(".multiview-write-check-{}", std::process::id()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&check)
        .map_err(output_dir_err)?;
    std::fs::remove_file(&check).map_err(output_dir_err)
}

pub struct CaptureOrchestrator<'a> {
    viewport: &'a mut dyn Viewport,
    settings: CaptureSettings,
    cancel: Option<CancelFlag>,
}

impl<'a> CaptureOrchestrator<'a> {
    pub fn new(viewport: &'a mut dyn Viewport, settings: CaptureSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(CaptureOrchestrator {
            viewport,
            settings,
            cancel: None,
        })
    }

    /// Check `flag` between views and stop once it is set.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Capture every view of `plan` into `output_dir`.
    ///
    /// `on_result` sees each result as soon as its view is done, with the
    /// view's position in the plan. The orchestrator is consumed so the camera
    /// is pulled back exactly once per run.
    pub async fn run<F>(mut self, plan: &ViewPlan, output_dir: &Path, mut on_result: F) -> Result<CaptureReport, CaptureError>
    where
        F: FnMut(usize, &CaptureResult),
    {
        let orientations = plan
            .iter()
            .map(|view| {
                resolve_orientation(view).map_err(|source| CaptureError::Geometry {
                    view: view.label(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        prepare_output_dir(output_dir)?;
        self.pull_back_camera()?;

        let mut report = CaptureReport::default();
        for (position, (view, orientation)) in plan.iter().zip(orientations).enumerate() {
            if self.is_cancelled() {
                warn!("capture cancelled after {position} of {} views", plan.len());
                report.cancelled = true;
                break;
            }

            let output_path = naming::path_for(output_dir, view, self.settings.image_format);
            let result = self.capture(view, orientation, output_path).await;
            on_result(position, &result);
            report.results.push(result);
        }

        Ok(report)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn pull_back_camera(&mut self) -> Result<(), CaptureError> {
        // Frame once first so the starting distance reflects the model size.
        self.viewport.fit_all().map_err(CaptureError::Camera)?;

        let camera = self.viewport.active_camera();
        let position = camera.position().map_err(CaptureError::Camera)?;
        let scaled = scale_position(&position, self.settings.distance_scale);
        debug!("pulling camera back from {position} to {scaled}");
        camera.set_position(&scaled).map_err(CaptureError::Camera)
    }

    async fn capture(&mut self, view: &ViewSpec, orientation: Option<Orientation>, output_path: PathBuf) -> CaptureResult {
        info!("capturing {} to `{}`", view.label(), output_path.display());
        match self.capture_frame(orientation, &output_path).await {
            Ok(settle) => CaptureResult {
                view: view.clone(),
                output_path,
                error: None,
                settle_warning: settle == Settle::TimedOut,
            },
            Err(err) => {
                warn!("capturing {} failed: {err}", view.label());
                CaptureResult {
                    view: view.clone(),
                    output_path,
                    error: Some(err),
                    settle_warning: false,
                }
            }
        }
    }

    async fn capture_frame(&mut self, orientation: Option<Orientation>, path: &Path) -> Result<Settle, HostError> {
        match orientation {
            Some(orientation) => self.viewport.active_camera().set_orientation(&orientation)?,
            None => self.viewport.use_builtin_isometric_view()?,
        }
        self.viewport.fit_all()?;
        let settle = self.settle().await?;
        self.viewport.export_frame(path, &self.settings.export_options())?;
        Ok(settle)
    }

    async fn settle(&mut self) -> Result<Settle, HostError> {
        let timeout = self.settings.settle_timeout;
        match tokio::time::timeout(timeout, self.viewport.flush_and_wait(timeout)).await {
            Ok(Ok(FrameSignal::Rendered)) => Ok(Settle::Confirmed),
            Ok(Ok(FrameSignal::NoSignal)) => {
                tokio::time::sleep(self.settings.settle_delay).await;
                Ok(Settle::Delayed)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!("viewport did not confirm a rendered frame within {timeout:?}, capturing anyway");
                Ok(Settle::TimedOut)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use nalgebra::Vector3;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        host::Camera,
        view_plan::{PlanConfig, PresetView, RandomView},
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Orient(Orientation),
        Isometric,
        FitAll,
        Flush(Duration),
        Export(String),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct MockCamera {
        position: Point3<f64>,
        positions_set: Vec<Point3<f64>>,
        log: Log,
    }

    impl Camera for MockCamera {
        fn position(&self) -> Result<Point3<f64>, HostError> {
            Ok(self.position)
        }

        fn set_position(&mut self, position: &Point3<f64>) -> Result<(), HostError> {
            self.position = *position;
            self.positions_set.push(*position);
            Ok(())
        }

        fn set_orientation(&mut self, orientation: &Orientation) -> Result<(), HostError> {
            self.log.borrow_mut().push(Call::Orient(*orientation));
            Ok(())
        }
    }

    struct MockViewport {
        camera: MockCamera,
        log: Log,
        signal: FrameSignal,
        never_settles: bool,
        failing_exports: Vec<&'static str>,
    }

    impl MockViewport {
        fn new() -> Self {
            let log = Log::default();
            MockViewport {
                camera: MockCamera {
                    position: Point3::new(1.0, 1.0, 1.0),
                    positions_set: vec![],
                    log: log.clone(),
                },
                log,
                signal: FrameSignal::Rendered,
                never_settles: false,
                failing_exports: vec![],
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.log.borrow().clone()
        }

        fn exports(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Export(name) => Some(name),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait::async_trait(?Send)]
    impl Viewport for MockViewport {
        fn active_camera(&mut self) -> &mut dyn Camera {
            &mut self.camera
        }

        fn fit_all(&mut self) -> Result<(), HostError> {
            self.log.borrow_mut().push(Call::FitAll);
            Ok(())
        }

        fn use_builtin_isometric_view(&mut self) -> Result<(), HostError> {
            self.log.borrow_mut().push(Call::Isometric);
            Ok(())
        }

        async fn flush_and_wait(&mut self, timeout: Duration) -> Result<FrameSignal, HostError> {
            self.log.borrow_mut().push(Call::Flush(timeout));
            if self.never_settles {
                std::future::pending::<()>().await;
            }
            Ok(self.signal)
        }

        fn export_frame(&mut self, path: &Path, _options: &ExportOptions) -> Result<(), HostError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.log.borrow_mut().push(Call::Export(name.clone()));
            if self.failing_exports.iter().any(|prefix| name.starts_with(prefix)) {
                return Err(HostError::Render("disk full".to_string()));
            }
            Ok(())
        }
    }

    fn settings() -> CaptureSettings {
        CaptureSettings {
            settle_delay: Duration::ZERO,
            settle_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn default_plan() -> ViewPlan {
        ViewPlan::build(&PlanConfig {
            random_views: 10,
            seed: Some(1),
        })
        .unwrap()
    }

    fn presets_only() -> ViewPlan {
        ViewPlan::build(&PlanConfig {
            random_views: 0,
            seed: None,
        })
        .unwrap()
    }

    async fn run(viewport: &mut MockViewport, plan: &ViewPlan, settings: CaptureSettings) -> CaptureReport {
        let dir = tempfile::tempdir().unwrap();
        CaptureOrchestrator::new(viewport, settings)
            .unwrap()
            .run(plan, dir.path(), |_, _| {})
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_run_captures_every_view_in_order() {
        let mut viewport = MockViewport::new();
        let plan = default_plan();
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("renders");

        let mut seen = vec![];
        let report = CaptureOrchestrator::new(&mut viewport, settings())
            .unwrap()
            .run(&plan, &output_dir, |position, result| seen.push((position, result.view.label())))
            .await
            .unwrap();

        assert!(output_dir.is_dir());
        assert_eq!(report.results.len(), 17);
        assert!(report.is_complete());
        assert_eq!(report.succeeded(), 17);

        let labels: Vec<String> = report.results.iter().map(|result| result.view.label()).collect();
        let mut expected: Vec<String> = PresetView::ALL.iter().map(|preset| preset.to_string()).collect();
        expected.extend((1..=10).map(|index| format!("random_view_{index}")));
        assert_eq!(labels, expected);
        assert_eq!(seen, labels.into_iter().enumerate().collect::<Vec<_>>());

        let expected_files: Vec<String> = plan
            .iter()
            .map(|view| naming::file_name(view, ImageFormat::Png))
            .collect();
        assert_eq!(viewport.exports(), expected_files);
        for (result, file) in report.results.iter().zip(&expected_files) {
            assert_eq!(result.output_path, output_dir.join(file));
        }
    }

    #[tokio::test]
    async fn test_each_view_orients_fits_settles_then_exports() {
        let mut viewport = MockViewport::new();
        run(&mut viewport, &presets_only(), settings()).await;

        let calls = viewport.calls();
        // The initial framing before the pull-back.
        assert_eq!(calls[0], Call::FitAll);
        assert_eq!(
            calls[1..5],
            [
                Call::Isometric,
                Call::FitAll,
                Call::Flush(Duration::from_secs(5)),
                Call::Export("isometric.png".to_string()),
            ]
        );

        let top = rotation_aligning(&camera_forward(), &Vector3::z()).unwrap();
        assert_eq!(
            calls[5..9],
            [
                Call::Orient(top),
                Call::FitAll,
                Call::Flush(Duration::from_secs(5)),
                Call::Export("top.png".to_string()),
            ]
        );
        assert_eq!(calls.len(), 1 + 7 * 4);
    }

    #[tokio::test]
    async fn test_random_views_use_the_exact_axis() {
        let mut viewport = MockViewport::new();
        let axis = Vector3::new(0.123456, -0.654321, 0.745).normalize();
        let plan = ViewPlan::from_views(vec![ViewSpec::Random(RandomView {
            index: 1,
            axis,
            angle: 2.5,
        })]);
        run(&mut viewport, &plan, settings()).await;

        let expected = axis_angle_orientation(&axis, 2.5).unwrap();
        assert!(viewport.calls().contains(&Call::Orient(expected)));
    }

    #[tokio::test]
    async fn test_camera_is_pulled_back_once() {
        let mut viewport = MockViewport::new();
        run(&mut viewport, &default_plan(), settings()).await;

        assert_eq!(viewport.camera.positions_set.len(), 1);
        let pulled = viewport.camera.positions_set[0];
        assert!((pulled - Point3::new(1.8, 1.8, 1.8)).norm() < 1e-12);
    }

    #[test]
    fn test_scale_position() {
        assert_eq!(
            scale_position(&Point3::new(1.0, -2.0, 0.5), 2.0),
            Point3::new(2.0, -4.0, 1.0)
        );
    }

    #[tokio::test]
    async fn test_export_failure_does_not_stop_the_run() {
        let mut viewport = MockViewport::new();
        viewport.failing_exports = vec!["random_view_5_"];
        let report = run(&mut viewport, &default_plan(), settings()).await;

        assert_eq!(report.results.len(), 17);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());

        let random: Vec<&CaptureResult> = report
            .results
            .iter()
            .filter(|result| matches!(result.view, ViewSpec::Random(_)))
            .collect();
        assert!(!random[4].succeeded());
        assert!(matches!(random[4].error, Some(HostError::Render(_))));
        for (i, result) in report.results.iter().enumerate() {
            assert_eq!(result.succeeded(), i != 7 + 4, "result {i}");
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_frames_are_captured_with_a_warning() {
        let mut viewport = MockViewport::new();
        viewport.never_settles = true;
        let report = run(
            &mut viewport,
            &presets_only(),
            CaptureSettings {
                settle_timeout: Duration::from_millis(5),
                ..settings()
            },
        )
        .await;

        assert_eq!(report.succeeded(), 7);
        assert!(report.results.iter().all(|result| result.settle_warning));
        assert_eq!(viewport.exports().len(), 7);
    }

    #[tokio::test]
    async fn test_hosts_without_a_signal_wait_the_settle_delay() {
        let mut viewport = MockViewport::new();
        viewport.signal = FrameSignal::NoSignal;
        let start = std::time::Instant::now();
        let report = run(
            &mut viewport,
            &presets_only(),
            CaptureSettings {
                settle_delay: Duration::from_millis(10),
                ..settings()
            },
        )
        .await;

        assert!(start.elapsed() >= Duration::from_millis(70));
        assert!(report.is_complete());
        assert!(report.results.iter().all(|result| !result.settle_warning));
    }

    #[tokio::test]
    async fn test_degenerate_axis_aborts_before_any_capture() {
        let mut viewport = MockViewport::new();
        let plan = ViewPlan::from_views(vec![
            ViewSpec::Preset(PresetView::Top),
            ViewSpec::Random(RandomView {
                index: 1,
                axis: Vector3::zeros(),
                angle: 1.0,
            }),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("renders");

        let err = CaptureOrchestrator::new(&mut viewport, settings())
            .unwrap()
            .run(&plan, &output_dir, |_, _| {})
            .await
            .unwrap_err();

        assert!(
            matches!(&err, CaptureError::Geometry { view, .. } if view == "random_view_1"),
            "{err:?}"
        );
        assert!(viewport.calls().is_empty());
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_output_path_that_is_a_file_is_rejected() {
        let mut viewport = MockViewport::new();
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = CaptureOrchestrator::new(&mut viewport, settings())
            .unwrap()
            .run(&presets_only(), file.path(), |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Config(ConfigError::OutputNotDirectory(_))));
        assert!(viewport.exports().is_empty());
    }

    // Nothing can be created under /proc/self, even as root.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_unwritable_output_dir_is_rejected() {
        let mut viewport = MockViewport::new();

        let err = CaptureOrchestrator::new(&mut viewport, settings())
            .unwrap()
            .run(&presets_only(), Path::new("/proc/self"), |_, _| {})
            .await
            .unwrap_err();

        assert!(
            matches!(err, CaptureError::Config(ConfigError::OutputDirectory { .. })),
            "{err}"
        );
        assert!(viewport.calls().is_empty());
    }

    #[test]
    fn test_prepare_output_dir_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("renders");

        prepare_output_dir(&output_dir).unwrap();
        prepare_output_dir(&output_dir).unwrap();

        assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        for settings in [
            CaptureSettings {
                distance_scale: 1.0,
                ..settings()
            },
            CaptureSettings {
                distance_scale: f64::NAN,
                ..settings()
            },
            CaptureSettings { width: 0, ..settings() },
            CaptureSettings { height: 0, ..settings() },
        ] {
            let mut viewport = MockViewport::new();
            assert!(matches!(
                CaptureOrchestrator::new(&mut viewport, settings),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_between_views() {
        let mut viewport = MockViewport::new();
        let flag = CancelFlag::default();
        let dir = tempfile::tempdir().unwrap();

        let report = CaptureOrchestrator::new(&mut viewport, settings())
            .unwrap()
            .with_cancel_flag(flag.clone())
            .run(&default_plan(), dir.path(), |position, _| {
                if position == 2 {
                    flag.store(true, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(!report.is_complete());
        assert_eq!(report.results.len(), 3);
        assert_eq!(viewport.exports(), ["isometric.png", "top.png", "bottom.png"]);
    }
}

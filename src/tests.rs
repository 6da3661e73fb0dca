use pretty_assertions::assert_eq;
use test_context::{test_context, AsyncTestContext};

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    name: String,
    args: Vec<String>,
    want_out: String,
    want_err: String,
    want_code: i32,
}

/// Points the configuration at an empty directory and clears overrides.
struct MainContext {
    dir: tempfile::TempDir,
    orig_env: Vec<(&'static str, Result<String, std::env::VarError>)>,
}

const ENV_VARS: &[&str] = &[
    "MULTIVIEW_CONFIG_DIR",
    "MULTIVIEW_IMAGE_WIDTH",
    "MULTIVIEW_RANDOM_VIEWS",
    "MULTIVIEW_FORMAT",
];

#[async_trait::async_trait]
impl AsyncTestContext for MainContext {
    async fn setup() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let orig_env = ENV_VARS.iter().map(|&name| (name, std::env::var(name))).collect();
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
        std::env::set_var("MULTIVIEW_CONFIG_DIR", dir.path());

        Self { dir, orig_env }
    }

    async fn teardown(self) {
        for (name, orig) in self.orig_env {
            if let Ok(val) = orig {
                std::env::set_var(name, val);
            } else {
                std::env::remove_var(name);
            }
        }
    }
}

fn args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_completion(_ctx: &mut MainContext) {
    run_test(TestItem {
        name: "bash completion".to_string(),
        args: args(&["multiview", "completion"]),
        want_out: "complete -F _multiview -o nosort -o bashdefault -o default multiview".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "zsh completion".to_string(),
        args: args(&["multiview", "completion", "-s", "zsh"]),
        want_out: "#compdef multiview".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_version(_ctx: &mut MainContext) {
    run_test(TestItem {
        name: "version".to_string(),
        args: args(&["multiview", "version"]),
        want_out: format!("multiview {}", clap::crate_version!()),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_unknown_subcommand(_ctx: &mut MainContext) {
    run_test(TestItem {
        name: "unknown subcommand".to_string(),
        args: args(&["multiview", "snapshot"]),
        want_out: "".to_string(),
        want_err: "unrecognized subcommand 'snapshot'".to_string(),
        want_code: 2,
    })
    .await;
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_plan(_ctx: &mut MainContext) {
    run_test(TestItem {
        name: "plan lists presets then random views".to_string(),
        args: args(&["multiview", "plan", "--seed", "3", "--format", "yaml"]),
        want_out: "- view: isometric\n  direction: host isometric\n  angle: ''\n  file: isometric.png\n- view: top\n"
            .to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "plan respects random view count".to_string(),
        args: args(&["multiview", "plan", "-n", "1", "-t", "jpeg", "--format", "json"]),
        want_out: "\"view\": \"random_view_1\"".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "plan rejects a huge random view count".to_string(),
        args: args(&["multiview", "plan", "-n", "18446744073709551615"]),
        want_out: "".to_string(),
        want_err: "invalid value `18446744073709551615` for `random_views`: must be at most 10000".to_string(),
        want_code: 1,
    })
    .await;
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_plan_uses_env_override(_ctx: &mut MainContext) {
    std::env::set_var("MULTIVIEW_RANDOM_VIEWS", "0");
    let (code, stdout, _) = run(args(&["multiview", "plan", "--format", "json"])).await;
    assert_eq!(code, 0);

    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[6]["view"], "left");
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_render_a_mesh(ctx: &mut MainContext) {
    let input = crate::host::preview::test_support::write_tetrahedron(ctx.dir.path());
    let output_dir = ctx.dir.path().join("renders");

    run_test(TestItem {
        name: "render a mesh".to_string(),
        args: args(&[
            "multiview",
            "render",
            input.to_str().unwrap(),
            output_dir.to_str().unwrap(),
            "--width",
            "80",
            "--height",
            "60",
            "--random-views",
            "3",
            "--seed",
            "42",
            "--settle-delay-ms",
            "0",
        ]),
        want_out: "Captured 10 views to `".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    let mut files: Vec<String> = std::fs::read_dir(&output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    assert_eq!(files.len(), 10);
    for preset in ["isometric", "top", "bottom", "front", "rear", "right", "left"] {
        assert!(files.contains(&format!("{preset}.png")), "{files:?}");
    }
    for index in 1..=3 {
        let prefix = format!("random_view_{index}_axis_");
        assert!(files.iter().any(|file| file.starts_with(&prefix)), "{files:?}");
    }
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_render_failures(ctx: &mut MainContext) {
    let input = crate::host::preview::test_support::write_tetrahedron(ctx.dir.path());
    let output_dir = ctx.dir.path().join("renders");
    let step = ctx.dir.path().join("bracket.step");
    std::fs::write(&step, "ISO-10303-21;").unwrap();
    let unknown = ctx.dir.path().join("bracket.obj");
    std::fs::write(&unknown, "v 0 0 0").unwrap();

    run_test(TestItem {
        name: "step is not supported by the preview host".to_string(),
        args: args(&["multiview", "render", step.to_str().unwrap(), output_dir.to_str().unwrap()]),
        want_out: "".to_string(),
        want_err: "step import is not supported by this host".to_string(),
        want_code: 1,
    })
    .await;

    run_test(TestItem {
        name: "unknown extension".to_string(),
        args: args(&["multiview", "render", unknown.to_str().unwrap(), output_dir.to_str().unwrap()]),
        want_out: "".to_string(),
        want_err: "pass `--src-format` explicitly".to_string(),
        want_code: 1,
    })
    .await;

    run_test(TestItem {
        name: "distance scale must pull back".to_string(),
        args: args(&[
            "multiview",
            "render",
            input.to_str().unwrap(),
            output_dir.to_str().unwrap(),
            "--distance-scale",
            "1",
        ]),
        want_out: "".to_string(),
        want_err: "invalid value `1` for `distance_scale`: must be greater than 1.0".to_string(),
        want_code: 1,
    })
    .await;

    run_test(TestItem {
        name: "output path is a file".to_string(),
        args: args(&["multiview", "render", input.to_str().unwrap(), input.to_str().unwrap()]),
        want_out: "".to_string(),
        want_err: "exists and is not a directory".to_string(),
        want_code: 1,
    })
    .await;

    assert!(!output_dir.exists());
}

#[test_context(MainContext)]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn serial_test_config_set_then_render(ctx: &mut MainContext) {
    run_test(TestItem {
        name: "set image format".to_string(),
        args: args(&["multiview", "config", "set", "image_format", "jpeg"]),
        want_out: "".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "get image format".to_string(),
        args: args(&["multiview", "config", "get", "image_format"]),
        want_out: "jpeg\n".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "plan picks up the stored format".to_string(),
        args: args(&["multiview", "plan", "-n", "0"]),
        want_out: "isometric.jpg".to_string(),
        want_err: "".to_string(),
        want_code: 0,
    })
    .await;

    run_test(TestItem {
        name: "set an unknown key".to_string(),
        args: args(&["multiview", "config", "set", "zoom", "2"]),
        want_out: "".to_string(),
        want_err: "invalid key: zoom".to_string(),
        want_code: 1,
    })
    .await;

    let stored = std::fs::read_to_string(ctx.dir.path().join("config.toml")).unwrap();
    assert!(stored.contains("image_format = \"jpeg\""), "{stored}");
}

/// Run `args` against a configuration loaded the way `main` loads it.
async fn run(args: Vec<String>) -> (i32, String, String) {
    let mut config = crate::config_file::parse_default_config().unwrap();
    let mut c = crate::config_from_env::EnvConfig::inherit_env(&mut config);

    let (io, stdout_path, stderr_path) = crate::iostreams::IoStreams::test();
    let mut ctx = crate::context::Context {
        config: &mut c,
        io,
        debug: false,
    };

    let code = crate::do_main(args, &mut ctx).await.unwrap();

    let stdout = std::fs::read_to_string(stdout_path).unwrap_or_default();
    let stderr = std::fs::read_to_string(stderr_path).unwrap_or_default();
    (code, stdout, stderr)
}

async fn run_test(t: TestItem) {
    let (code, stdout, stderr) = run(t.args).await;

    assert!(
        stdout.contains(&t.want_out),
        "test {} ->\nstdout: {}\nwant: {}\n\nstderr: {}",
        t.name,
        stdout,
        t.want_out,
        stderr,
    );
    assert_eq!(code, t.want_code, "test {} -> stderr: {}", t.name, stderr);
    assert_eq!(stdout.is_empty(), t.want_out.is_empty(), "test {} -> stdout: {}", t.name, stdout);
    assert_eq!(
        stderr.is_empty(),
        t.want_err.is_empty(),
        "test {} -> stderr: {}\nwant_err: {}",
        t.name,
        stderr,
        t.want_err
    );
    assert!(
        stderr.contains(&t.want_err),
        "test {} ->\nstderr: {}\nwant: {}\n\nstdout: {}",
        t.name,
        stderr,
        t.want_err,
        stdout,
    );
}

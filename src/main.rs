//! The multiview command line tool.

mod cmd;
/// The completion command.
pub mod cmd_completion;
/// The config command.
pub mod cmd_config;
/// The plan command.
pub mod cmd_plan;
/// The render command.
pub mod cmd_render;
/// The version command.
pub mod cmd_version;

// Use of a mod or pub mod is not actually necessary.
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

mod capture;
mod colors;
mod config;
mod config_file;
mod config_from_env;
mod config_from_file;
mod context;
mod error;
mod host;
mod iostreams;
mod loader;
mod naming;
mod orientation;
mod types;
mod view_plan;

#[cfg(test)]
mod tests;

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use slog::Drain;

/// Capture a 3D model from seven preset views and a set of random ones.
///
/// Every run captures, in order: isometric, top, bottom, front, rear, right,
/// left, then the random views, one image per view.
///
/// Environment variables that can be used with `multiview`.
///
/// MULTIVIEW_<KEY>: override a configuration setting for this run, e.g.
/// MULTIVIEW_IMAGE_WIDTH=640 or MULTIVIEW_DISTANCE_SCALE=2.
///
/// DEBUG: set to any value to enable verbose output to standard error.
///
/// NO_COLOR: set to any value to avoid printing ANSI escape sequences for color output.
///
/// CLICOLOR: set to "0" to disable printing ANSI colors in output.
///
/// CLICOLOR_FORCE: set to a value other than "0" to keep ANSI colors in output
/// even when the output is piped.
///
/// MULTIVIEW_CONFIG_DIR: the directory where `multiview` will store configuration files.
/// Default: `$XDG_CONFIG_HOME/multiview` or `$HOME/.config/multiview`.
#[derive(Parser, Debug, Clone)]
#[clap(version = clap::crate_version!(), author = clap::crate_authors!("\n"))]
pub(crate) struct Opts {
    /// Print debug info
    #[clap(short, long, global = true, env)]
    debug: bool,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug, Clone)]
enum SubCommand {
    Completion(cmd_completion::CmdCompletion),
    Config(cmd_config::CmdConfig),
    Plan(cmd_plan::CmdPlan),
    Render(cmd_render::CmdRender),
    Version(cmd_version::CmdVersion),
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    // Let's get our configuration.
    let mut c = match crate::config_file::parse_default_config() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    };
    let mut config = crate::config_from_env::EnvConfig::inherit_env(&mut c);
    let mut ctx = crate::context::Context::new(&mut config);

    // Let's grab all our args.
    let args: Vec<String> = std::env::args().collect();
    let result = do_main(args, &mut ctx).await;

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

async fn do_main(args: Vec<String>, ctx: &mut crate::context::Context<'_>) -> Result<i32> {
    // Parse the command line arguments.
    let opts = match Opts::try_parse_from(args) {
        Ok(opts) => opts,
        Err(err) => {
            // Help and version requests land here too, on stdout and with a zero exit code.
            if err.use_stderr() {
                write!(ctx.io.err_out, "{}", err.render())?;
            } else {
                write!(ctx.io.out, "{}", err.render())?;
            }
            return Ok(err.exit_code());
        }
    };

    // Set our debug flag.
    ctx.debug = opts.debug;

    // Setup our logger. This is mainly for debug purposes.
    // The capture core logs through `log`, which is bridged into slog here.
    if ctx.debug {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();

        let logger = slog::Logger::root(drain, slog::o!());

        let scope_guard = slog_scope::set_global_logger(logger);
        scope_guard.cancel_reset();

        slog_stdlog::init_with_level(log::Level::Debug)?;
    }

    match opts.subcmd {
        SubCommand::Completion(cmd) => run_cmd(&cmd, ctx).await,
        SubCommand::Config(cmd) => run_cmd(&cmd, ctx).await,
        SubCommand::Plan(cmd) => run_cmd(&cmd, ctx).await,
        SubCommand::Render(cmd) => run_cmd(&cmd, ctx).await,
        SubCommand::Version(cmd) => run_cmd(&cmd, ctx).await,
    }
}

async fn run_cmd(cmd: &impl crate::cmd::Command, ctx: &mut context::Context<'_>) -> Result<i32> {
    let cs = ctx.io.color_scheme();

    if let Err(err) = cmd.run(ctx).await {
        writeln!(ctx.io.err_out, "{} {err:#}", cs.failure_icon())?;
        return Ok(1);
    }

    Ok(0)
}

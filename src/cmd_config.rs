use anyhow::{bail, Result};
use clap::Parser;

use crate::config::CONFIG_OPTIONS;

/// Manage configuration for `multiview`.
///
/// Current respected settings:
/// - image_width: the width of captured frames in pixels (default: 1024)
/// - image_height: the height of captured frames in pixels (default: 768)
/// - background: the fill color behind the model (default: "white")
/// - distance_scale: how far the camera is pulled back before capturing (default: 1.8)
/// - settle_delay_ms: the wait after a redraw when the host cannot confirm it (default: 500)
/// - settle_timeout_ms: the longest wait for the host to confirm a redraw (default: 2000)
/// - random_views: the number of random views after the presets (default: 10)
/// - image_format: the encoding of captured frames (default: "png")
/// - format: the formatting style for command output (default: "table")
///
/// Any setting can be overridden for a single run with an environment
/// variable named after it, e.g. `MULTIVIEW_IMAGE_WIDTH=640`.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdConfig {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug, Clone)]
enum SubCommand {
    Set(CmdConfigSet),
    List(CmdConfigList),
    Get(CmdConfigGet),
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdConfig {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        match &self.subcmd {
            SubCommand::Get(cmd) => cmd.run(ctx).await,
            SubCommand::Set(cmd) => cmd.run(ctx).await,
            SubCommand::List(cmd) => cmd.run(ctx).await,
        }
    }
}

/// Print the value of a given configuration key.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdConfigGet {
    /// The key to get the value of.
    #[clap(name = "key", required = true)]
    pub key: String,
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdConfigGet {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        match ctx.config.get(&self.key) {
            Ok(value) => writeln!(ctx.io.out, "{value}")?,
            Err(err) => {
                bail!("{err}");
            }
        }

        Ok(())
    }
}

/// Update configuration with a value for the given key.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdConfigSet {
    /// The key to set the value of.
    #[clap(name = "key", required = true)]
    pub key: String,

    /// The value to set.
    #[clap(name = "value", required = true)]
    pub value: String,
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdConfigSet {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        crate::config::validate_key(&self.key)?;
        crate::config::validate_value(&self.key, &self.value)?;
        ctx.config.check_writable(&self.key)?;

        if let Err(err) = ctx.config.set(&self.key, Some(&self.value)) {
            bail!("{err}");
        }

        // Write the config file.
        if let Err(err) = ctx.config.write() {
            bail!("{err}");
        }

        Ok(())
    }
}

/// Print a list of configuration keys and values.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdConfigList {}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdConfigList {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        for option in CONFIG_OPTIONS {
            let value = ctx.config.get(option.key)?;
            writeln!(ctx.io.out, "{}\n{}={value}\n", option.description, option.key)?;
        }

        Ok(())
    }
}

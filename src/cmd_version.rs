use anyhow::Result;
use clap::Parser;

/// Prints version information for the CLI.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdVersion {}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdVersion {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        writeln!(
            ctx.io.out,
            "multiview {} ({}, {} build)",
            crate::built_info::PKG_VERSION,
            crate::built_info::TARGET,
            crate::built_info::PROFILE,
        )?;
        writeln!(ctx.io.out, "{}", crate::built_info::RUSTC_VERSION)?;

        Ok(())
    }
}

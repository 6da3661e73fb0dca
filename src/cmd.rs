use anyhow::Result;

/// This trait describes a command.
#[async_trait::async_trait(?Send)]
pub trait Command {
    /// Run the command.
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()>;
}

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

/// Generate shell completion scripts.
///
/// When installing `multiview` CLI through a package manager, it's possible that
/// no additional shell configuration is necessary to gain completion support.
///
/// If you need to set up completions manually, follow the instructions below.
/// The exact config file locations might vary based on your system. Make sure
/// to restart your shell before testing whether completions are working.
///
/// ### bash
///
/// First, ensure that you install `bash-completion` using your package manager.
///
/// After, add this to your `~/.bash_profile`:
///
///         eval "$(multiview completion -s bash)"
///
/// ### zsh
///
/// Generate a `_multiview` completion script and put it somewhere in your `$fpath`:
///
///         multiview completion -s zsh > /usr/local/share/zsh/site-functions/_multiview
///
/// Ensure that the following is present in your `~/.zshrc`:
///
///         autoload -U compinit
///         compinit -i
///
/// ### fish
///
/// Generate a `multiview.fish` completion script:
///
///         multiview completion -s fish > ~/.config/fish/completions/multiview.fish
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct CmdCompletion {
    /// Shell type: {bash|zsh|fish|powershell|elvish}
    #[clap(short, long, default_value = "bash")]
    pub shell: Shell,
}

#[async_trait::async_trait(?Send)]
impl crate::cmd::Command for CmdCompletion {
    async fn run(&self, ctx: &mut crate::context::Context) -> Result<()> {
        let mut app = crate::Opts::command();
        let name = app.get_name().to_string();
        clap_complete::generate(self.shell, &mut app, name, &mut ctx.io.out);
        Ok(())
    }
}

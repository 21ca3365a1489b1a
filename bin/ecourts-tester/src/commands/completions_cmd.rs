use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::Cli;

/// Generate shell completion scripts.
pub fn run(shell: &str) -> anyhow::Result<()> {
    let shell = match shell.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" | "ps" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        _ => {
            anyhow::bail!(
                "Unsupported shell: {}. Options: bash, zsh, fish, powershell, elvish",
                shell
            );
        }
    };

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ecourts-tester", &mut std::io::stdout());

    eprintln!();
    eprintln!("# Usage:");
    match shell {
        Shell::Bash => {
            eprintln!("#   eval \"$(ecourts-tester completions bash)\"");
        }
        Shell::Zsh => {
            eprintln!("#   ecourts-tester completions zsh > ~/.zfunc/_ecourts-tester");
        }
        Shell::Fish => {
            eprintln!("#   ecourts-tester completions fish > ~/.config/fish/completions/ecourts-tester.fish");
        }
        _ => {}
    }

    Ok(())
}

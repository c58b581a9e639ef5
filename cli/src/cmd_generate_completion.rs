// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, fs, io, path::Path, path::PathBuf};

use clap::{ArgMatches, Command, ValueEnum, ValueHint, arg, value_parser};
use clap_complete::{Generator, generate};
use clap_complete_nushell::Nushell;

use crate::Cli;

/// Writes a completion script for the `tasksync` binary.
#[derive(Debug, Clone)]
pub struct CmdGenerateCompletion {
    /// Target shell; taken from `$SHELL` when not given.
    pub shell: Option<Shell>,
    /// Script destination; stdout when not given.
    pub output: Option<PathBuf>,
}

impl CmdGenerateCompletion {
    pub const NAME: &str = "generate-completion";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Generate shell completion, for $SHELL unless a shell is given")
            .hide(true)
            .arg(arg!(shell: [SHELL] "The shell to generate for").value_parser(value_parser!(Shell)))
            .arg(
                arg!(-o --output <FILE> "Write the script to a file instead of stdout")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            shell: matches.get_one::<Shell>("shell").copied(),
            output: matches.get_one::<PathBuf>("output").cloned(),
        }
    }

    pub fn run(self) -> Result<(), Box<dyn Error>> {
        let shell = match self.shell {
            Some(shell) => shell,
            None => std::env::var("SHELL")
                .ok()
                .and_then(|path| Shell::from_path(&path))
                .ok_or("cannot tell the shell from $SHELL, pass one explicitly")?,
        };
        tracing::debug!(?shell, output = ?self.output, "generating shell completion...");

        match &self.output {
            Some(path) => {
                let mut file = fs::File::create(path)
                    .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
                shell.generate(&mut file);
                tracing::info!(path = %path.display(), "completion script written");
            }
            None => shell.generate(&mut io::stdout()),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    Nushell,
    #[clap(name = "powershell")]
    #[allow(clippy::enum_variant_names)]
    PowerShell,
    Zsh,
}

impl Shell {
    /// Recognizes a shell by the file name of its executable, e.g. `/usr/bin/zsh`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = Path::new(path).file_stem()?.to_str()?;
        match name.to_ascii_lowercase().as_str() {
            "bash" => Some(Self::Bash),
            "elvish" => Some(Self::Elvish),
            "fish" => Some(Self::Fish),
            "nu" | "nushell" => Some(Self::Nushell),
            "pwsh" | "powershell" => Some(Self::PowerShell),
            "zsh" => Some(Self::Zsh),
            _ => None,
        }
    }

    pub fn generate(self, buf: &mut impl io::Write) {
        use clap_complete::Shell as ClapShell;

        match self {
            Self::Bash => write_script(ClapShell::Bash, buf),
            Self::Elvish => write_script(ClapShell::Elvish, buf),
            Self::Fish => write_script(ClapShell::Fish, buf),
            Self::Nushell => write_script(Nushell, buf),
            Self::PowerShell => write_script(ClapShell::PowerShell, buf),
            Self::Zsh => write_script(ClapShell::Zsh, buf),
        }
    }
}

fn write_script(generator: impl Generator, buf: &mut impl io::Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(generator, &mut cmd, name, buf);
}

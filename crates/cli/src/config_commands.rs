use anyhow::Result;
use clap::Subcommand;
use wafleet_config::validate::Severity;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show the fully-resolved config (file + env overrides) alongside diagnostics.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the path this process would load a config file from.
    Path,
    /// Write the current (default or discovered) config back to the user-global path.
    Save,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Check { verbose } => check(verbose),
        ConfigCommand::Path => path(),
        ConfigCommand::Save => save(),
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

fn check(verbose: bool) -> Result<()> {
    let cfg = wafleet_config::discover_and_load();
    let result = wafleet_config::validate(&cfg);

    if verbose {
        println!("{cfg:#?}");
        println!();
    }

    if result.diagnostics.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    for d in &result.diagnostics {
        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
        };
        println!("{color}{label}{RESET}: {}", d.message);
    }

    if result.has_errors() {
        anyhow::bail!("configuration has {} error(s)", result.diagnostics.iter().filter(|d| d.severity == Severity::Error).count());
    }
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", wafleet_config::find_or_default_config_path().display());
    Ok(())
}

fn save() -> Result<()> {
    let cfg = wafleet_config::discover_and_load();
    let path = wafleet_config::save_config(&cfg)?;
    println!("Saved config to {}", path.display());
    Ok(())
}

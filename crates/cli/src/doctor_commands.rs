//! `wafleet doctor` — health check, config validation, and secrets audit.
//!
//! Runs a series of checks against the local installation and prints a
//! structured report with `[ok]`, `[warn]`, or `[fail]` status per item.

use anyhow::Result;
use wafleet_config::validate::Severity;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
        }
    }
}

struct Section {
    title: String,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), items: Vec::new() }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }
}

pub async fn run() -> Result<()> {
    eprintln!("{BOLD}wafleet doctor{RESET}");
    eprintln!("{BOLD}=============={RESET}\n");

    let mut sections = Vec::new();
    sections.push(check_config());
    sections.push(check_secrets());
    sections.push(check_database().await);

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            eprintln!("  [{}{}{RESET}]  {message}", status.color(), status.label());
            match status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                Status::Ok => {},
            }
        }
        eprintln!();
    }
    (errors, warnings)
}

fn check_config() -> Section {
    let path = wafleet_config::find_or_default_config_path();
    let mut section = Section::new(format!("Config ({})", path.display()));

    if path.exists() {
        section.push(Status::Ok, "config file found");
    } else {
        section.push(Status::Warn, "no config file found; running on defaults + env overrides");
    }

    let cfg = wafleet_config::discover_and_load();
    for diag in wafleet_config::validate(&cfg).diagnostics {
        let status = match diag.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        section.push(status, diag.message);
    }
    section
}

fn check_secrets() -> Section {
    let mut section = Section::new("Secrets");
    match wafleet_config::load_secrets() {
        Ok(_) => section.push(Status::Ok, "all required secrets are set"),
        Err(e) => section.push(Status::Fail, e.to_string()),
    }
    section
}

async fn check_database() -> Section {
    let mut section = Section::new("Database");
    let Ok(secrets) = wafleet_config::load_secrets() else {
        section.push(Status::Fail, "cannot check database: secrets are not loaded");
        return section;
    };
    match sqlx::SqlitePool::connect(&secrets.database_url).await {
        Ok(pool) => {
            section.push(Status::Ok, format!("connected to {}", secrets.database_url));
            match wafleet_registry::run_migrations(&pool).await {
                Ok(()) => section.push(Status::Ok, "migrations up to date"),
                Err(e) => section.push(Status::Fail, format!("migration check failed: {e}")),
            }
        },
        Err(e) => section.push(Status::Fail, format!("cannot connect to {}: {e}", secrets.database_url)),
    }
    section
}

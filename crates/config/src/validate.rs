//! Non-fatal config validation: problems are reported, never used to abort
//! startup — matching the teacher's posture that a misconfigured value
//! should degrade loudly rather than crash a running fleet member.

use serde::Serialize;

use crate::schema::TenancyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Validate a loaded [`TenancyConfig`]. Returns diagnostics; never panics or
/// errors itself.
pub fn validate(cfg: &TenancyConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if cfg.server_name.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: "SERVER_NAME is not set; this tenancy has no canonical name".into(),
        });
    }

    if cfg.bot_count == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: "BOTCOUNT is 0; this tenancy can never host a bot".into(),
        });
    }

    if cfg.default_expiration_months == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: "default_expiration_months is 0; newly approved bots expire immediately"
                .into(),
        });
    }

    ValidationResult { diagnostics }
}

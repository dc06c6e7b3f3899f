use std::fmt;

/// Completion failure with enough context to debug a misbehaving provider:
/// which stage broke and the raw body when one was read.
#[derive(Debug, Clone)]
pub struct CompletionDiagnosticsError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for CompletionDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completion error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for CompletionDiagnosticsError {}

//! Command-line interface.

pub mod commands;
pub mod display;
pub mod progress;
pub mod types;

pub use types::{Cli, Commands};

/// Failure whose details were already written as the command's output.
///
/// In JSON mode nothing more is printed, so stdout carries one document.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AlreadyReported(pub String);

/// JSON body describing `err`, or `None` if the command already reported it.
pub fn json_error(err: &anyhow::Error) -> Option<serde_json::Value> {
    if err.is::<AlreadyReported>() {
        return None;
    }
    Some(serde_json::json!({
        "success": false,
        "error": format!("{err:#}"),
    }))
}

/// Report a command failure and exit with status 1.
///
/// In JSON mode the error goes to stdout as `{"success": false, "error": ...}`
/// so callers parsing the output see it; otherwise the full context chain is
/// printed to stderr.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        if let Some(body) = json_error(&err) {
            println!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_default()
            );
        }
    } else {
        eprintln!("{}", display::action_failure(&format!("Error: {err:#}")));
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_json_error_carries_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("MongoDB did not become reachable")
            .unwrap_err();

        let body = json_error(&err).expect("error body");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "MongoDB did not become reachable: connection refused");
    }

    #[test]
    fn test_already_reported_error_prints_nothing() {
        let err = anyhow::Error::new(AlreadyReported("schema mismatch".to_string()));
        assert!(json_error(&err).is_none());
        assert_eq!(err.to_string(), "schema mismatch");
    }
}

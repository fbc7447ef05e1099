use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PingErrorKind, ProbeFailure};
use crate::host::ProbeOutcome;

const UNREACHABLE_REASON: &str =
    "Destination host unreachable. The network path to the host could not be found.";
const TIMED_OUT_REASON: &str = "Request timed out. The host didn't respond within the time limit.";
const NOT_PERMITTED_REASON: &str =
    "Operation not permitted. The app may not have the necessary permissions.";
const UNKNOWN_REASON: &str = "Unknown reason. Please check the raw output for more details.";

/// The rendered result of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PingResult {
    Success {
        narrative: String,
    },
    /// `kind` is `None` for failures reported through the exit code; those keep
    /// the raw stream dumps instead of entering the taxonomy.
    Failure {
        kind: Option<PingErrorKind>,
        message: String,
    },
}

impl PingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PingResult::Success { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            PingResult::Success { narrative } => narrative,
            PingResult::Failure { message, .. } => message,
        }
    }

    fn narrative_failure(message: String) -> Self {
        PingResult::Failure {
            kind: None,
            message,
        }
    }
}

impl From<PingErrorKind> for PingResult {
    fn from(kind: PingErrorKind) -> Self {
        PingResult::Failure {
            message: kind.user_message(),
            kind: Some(kind),
        }
    }
}

/// Turns a completed `ping` run into a result, keyed on its exit code.
pub fn classify_outcome(outcome: &ProbeOutcome) -> PingResult {
    let ProbeOutcome {
        exit_code,
        stdout,
        stderr,
        target,
    } = outcome;

    match *exit_code {
        0 => PingResult::Success {
            narrative: format!("Ping successful.\n\n{}", stdout),
        },
        1 => {
            let reason = failure_reason(stdout, stderr);
            info!(host = %target, reason, "ping reported failure");
            PingResult::narrative_failure(format!(
                "Ping failed (Exit code: 1). Reason: {}\n\n\
                 This could be due to:\n\
                 1. The target host ({}) is down or not responding\n\
                 2. A firewall is blocking ICMP packets\n\
                 3. Network connectivity issues\n\
                 4. Insufficient permissions for the ping command\n\n\
                 Raw output:\n{}\n\
                 Error output:\n{}",
                reason, target, stdout, stderr
            ))
        }
        2 => {
            info!(host = %target, "ping rejected its arguments");
            PingResult::narrative_failure(format!(
                "Ping failed (Exit code: 2). This usually indicates an invalid command-line option.\n\n\
                 Raw output:\n{}\n\
                 Error output:\n{}",
                stdout, stderr
            ))
        }
        code => {
            warn!(host = %target, exit_code = code, "unexpected ping exit code");
            PingResult::narrative_failure(format!(
                "Ping failed with an unexpected exit code: {}\n\n\
                 Raw output:\n{}\n\
                 Error output:\n{}",
                code, stdout, stderr
            ))
        }
    }
}

// First match wins.
fn failure_reason(stdout: &str, stderr: &str) -> &'static str {
    if stdout.contains("Destination Host Unreachable") {
        UNREACHABLE_REASON
    } else if stdout.contains("Request timed out") {
        TIMED_OUT_REASON
    } else if stderr.contains("Operation not permitted") {
        NOT_PERMITTED_REASON
    } else {
        UNKNOWN_REASON
    }
}

/// Maps a runtime failure onto the closed error taxonomy.
pub fn classify_exception(failure: &ProbeFailure) -> PingErrorKind {
    let kind = match failure {
        ProbeFailure::Security(_) => PingErrorKind::PermissionDenied,
        ProbeFailure::UnresolvedHost(message) => PingErrorKind::UnknownHost(message.clone()),
        ProbeFailure::Io(e) => {
            let message = e.to_string();
            if message.contains("Permission denied") {
                PingErrorKind::PermissionDenied
            } else if message.contains("No route to host") {
                PingErrorKind::NetworkUnavailable
            } else {
                PingErrorKind::CommandExecutionError
            }
        }
        ProbeFailure::Interrupted => PingErrorKind::Timeout,
        ProbeFailure::Other(message) if message.is_empty() => {
            PingErrorKind::UnknownError("No additional information".to_string())
        }
        ProbeFailure::Other(message) => PingErrorKind::UnknownError(message.clone()),
    };

    warn!(error = %failure, ?kind, "probe failed");
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn outcome(exit_code: i32, stdout: &str, stderr: &str) -> ProbeOutcome {
        ProbeOutcome::new(exit_code, stdout.to_string(), stderr.to_string(), "192.0.2.1".to_string())
    }

    fn reason(result: &PingResult) -> &str {
        let text = result.text();
        let start = text.find("Reason: ").unwrap() + "Reason: ".len();
        let end = text[start..].find('\n').unwrap() + start;
        &text[start..end]
    }

    #[test]
    fn test_success_keeps_stdout_verbatim() {
        let stdout = "PING 8.8.8.8 (8.8.8.8) 56(84) bytes of data.\n4 packets transmitted, 4 received\n";
        let result = classify_outcome(&outcome(0, stdout, ""));

        assert!(result.is_success());
        assert!(result.text().starts_with("Ping successful.\n\nPING 8.8.8.8"));
        assert!(result.text().contains(stdout));

        let empty = classify_outcome(&outcome(0, "", ""));
        assert!(empty.is_success());
        assert_eq!(empty.text(), "Ping successful.\n\n");
    }

    #[test]
    fn test_exit_one_unreachable() {
        let result = classify_outcome(&outcome(
            1,
            "From 192.0.2.254 icmp_seq=1 Destination Host Unreachable\n",
            "",
        ));

        assert!(!result.is_success());
        assert!(result.text().contains("Reason: Destination host unreachable"));
        assert!(result.text().contains("1. The target host (192.0.2.1) is down or not responding\n"));
        assert!(result.text().contains("2. A firewall is blocking ICMP packets\n"));
        assert!(result.text().contains("3. Network connectivity issues\n"));
        assert!(result.text().contains("4. Insufficient permissions for the ping command\n"));
        assert!(matches!(result, PingResult::Failure { kind: None, .. }));
    }

    #[test]
    fn test_exit_one_reason_priority() {
        let both = outcome(1, "Request timed out\nDestination Host Unreachable\n", "Operation not permitted\n");
        assert_eq!(reason(&classify_outcome(&both)), UNREACHABLE_REASON);

        let timed_out = outcome(1, "Request timed out\n", "Operation not permitted\n");
        assert_eq!(reason(&classify_outcome(&timed_out)), TIMED_OUT_REASON);

        let not_permitted = outcome(1, "", "ping: socket: Operation not permitted\n");
        assert_eq!(reason(&classify_outcome(&not_permitted)), NOT_PERMITTED_REASON);

        // Only stderr is consulted for the permission phrase.
        let wrong_stream = outcome(1, "Operation not permitted\n", "");
        assert_eq!(reason(&classify_outcome(&wrong_stream)), UNKNOWN_REASON);
    }

    #[test]
    fn test_exit_one_dumps_both_streams() {
        let result = classify_outcome(&outcome(1, "out text\n", "err text\n"));
        assert!(result
            .text()
            .ends_with("Raw output:\nout text\n\nError output:\nerr text\n"));

        let empty = classify_outcome(&outcome(1, "", ""));
        assert!(!empty.is_success());
        assert_eq!(reason(&empty), UNKNOWN_REASON);
        assert!(empty.text().ends_with("Raw output:\n\nError output:\n"));

        let stderr_only = classify_outcome(&outcome(1, "", "ping: sendmsg failed\n"));
        assert!(stderr_only
            .text()
            .ends_with("Raw output:\n\nError output:\nping: sendmsg failed\n"));
    }

    #[test]
    fn test_exit_two_invalid_option() {
        let result = classify_outcome(&outcome(2, "", "ping: invalid option -- 'z'\n"));
        assert_eq!(
            result.text(),
            "Ping failed (Exit code: 2). This usually indicates an invalid command-line option.\n\n\
             Raw output:\n\n\
             Error output:\nping: invalid option -- 'z'\n"
        );
    }

    #[test]
    fn test_other_exit_codes() {
        for code in [-1, 3, 255] {
            let result = classify_outcome(&outcome(code, "", ""));
            assert!(!result.is_success());
            assert!(result
                .text()
                .starts_with(&format!("Ping failed with an unexpected exit code: {}\n\n", code)));
        }
    }

    #[test]
    fn test_classification_is_pure() {
        let o = outcome(1, "Request timed out\n", "");
        assert_eq!(classify_outcome(&o), classify_outcome(&o));
    }

    #[test]
    fn test_classify_exception_table() {
        assert_eq!(
            classify_exception(&ProbeFailure::Security("denied".to_string())),
            PingErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_exception(&ProbeFailure::UnresolvedHost("example.invalid".to_string())),
            PingErrorKind::UnknownHost("example.invalid".to_string())
        );
        assert_eq!(
            classify_exception(&ProbeFailure::Io(io::Error::new(
                io::ErrorKind::Other,
                "exec failed: Permission denied"
            ))),
            PingErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_exception(&ProbeFailure::Io(io::Error::new(
                io::ErrorKind::Other,
                "sendmsg: No route to host"
            ))),
            PingErrorKind::NetworkUnavailable
        );
        assert_eq!(
            classify_exception(&ProbeFailure::Io(io::Error::new(io::ErrorKind::NotFound, "missing"))),
            PingErrorKind::CommandExecutionError
        );
        assert_eq!(classify_exception(&ProbeFailure::Interrupted), PingErrorKind::Timeout);
        assert_eq!(
            classify_exception(&ProbeFailure::Other("worker panicked".to_string())),
            PingErrorKind::UnknownError("worker panicked".to_string())
        );
        assert_eq!(
            classify_exception(&ProbeFailure::Other(String::new())),
            PingErrorKind::UnknownError("No additional information".to_string())
        );
    }

    #[test]
    fn test_kind_renders_through_template() {
        let result = PingResult::from(PingErrorKind::PermissionDenied);
        assert_eq!(
            result.text(),
            "Configuration Error: Permission denied. The app might not have the necessary permissions.\nPlease check your app settings and permissions."
        );
        assert!(matches!(
            result,
            PingResult::Failure {
                kind: Some(PingErrorKind::PermissionDenied),
                ..
            }
        ));
    }

    #[test]
    fn test_result_serializes() {
        let json = serde_json::to_value(PingResult::from(PingErrorKind::Timeout)).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"]["kind"], "Timeout");
    }
}

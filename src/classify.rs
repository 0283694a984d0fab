//! Classification of completed backend exchanges.
//!
//! Every response ends up in exactly one of four buckets: success, domain
//! error (structurally valid, `success:false`), transport error (io
//! failure or a 500), or malformed (body is not the expected envelope).
//! The backend reports domain errors with 4xx statuses too, so any body
//! that parses as an envelope is classified by its `success` field.

use serde::Deserialize;

use crate::client::RawResponse;

/// Substring the backend emits when the git executable is missing.
pub const GIT_UNAVAILABLE_SIGNATURE: &str = "Git is not available";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub repositories: Option<Vec<String>>,
    #[serde(default)]
    pub commits: Option<Vec<CommitInfo>>,
    #[serde(default)]
    pub branches: Option<Vec<BranchInfo>>,
    #[serde(default)]
    pub remotes: Option<Vec<RemoteInfo>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    #[serde(default)]
    pub current: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteInfo {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Clone, Debug)]
pub enum Outcome {
    Success(Envelope),
    DomainError {
        message: String,
        git_unavailable: bool,
    },
    TransportError {
        message: String,
    },
    Malformed {
        message: String,
    },
}

pub fn classify(exchange: Result<RawResponse, String>) -> Outcome {
    let raw = match exchange {
        Ok(raw) => raw,
        Err(e) => {
            return Outcome::TransportError {
                message: format!("Network error: {}. Check your connection.", e),
            };
        }
    };

    if raw.status == 500 {
        return Outcome::TransportError {
            message: format!("Server error (500): {}", excerpt(&raw.body, 200)),
        };
    }

    let envelope: Envelope = match serde_json::from_str(&raw.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Outcome::Malformed {
                message: format!("Error parsing response: {}", e),
            };
        }
    };

    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "Unknown error".to_string());
        let git_unavailable = message.contains(GIT_UNAVAILABLE_SIGNATURE);
        return Outcome::DomainError {
            message,
            git_unavailable,
        };
    }

    Outcome::Success(envelope)
}

fn excerpt(body: &str, max_chars: usize) -> String {
    let mut out: String = body.chars().take(max_chars).collect();
    if body.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Result<RawResponse, String> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn success_payload() {
        let outcome = classify(response(200, r#"{"success":true,"output":"A"}"#));
        match outcome {
            Outcome::Success(envelope) => assert_eq!(envelope.output.as_deref(), Some("A")),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn domain_error_with_git_unavailable_signature() {
        let outcome = classify(response(
            200,
            r#"{"success":false,"error":"Git is not available on this system"}"#,
        ));
        match outcome {
            Outcome::DomainError {
                message,
                git_unavailable,
            } => {
                assert!(message.contains("Git is not available"));
                assert!(git_unavailable);
            }
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn domain_error_on_4xx_envelope() {
        // The backend reports busy/validation failures as 4xx envelopes.
        let outcome = classify(response(
            409,
            r#"{"error":"Another operation is in progress"}"#,
        ));
        match outcome {
            Outcome::DomainError {
                message,
                git_unavailable,
            } => {
                assert_eq!(message, "Another operation is in progress");
                assert!(!git_unavailable);
            }
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn missing_error_field_reads_unknown() {
        let outcome = classify(response(200, r#"{"success":false}"#));
        match outcome {
            Outcome::DomainError { message, .. } => assert_eq!(message, "Unknown error"),
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn http_500_is_transport() {
        let outcome = classify(response(500, "<html>Internal Server Error</html>"));
        match outcome {
            Outcome::TransportError { message } => {
                assert!(message.starts_with("Server error (500):"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn long_500_body_is_truncated() {
        let body = "x".repeat(500);
        let outcome = classify(response(500, &body));
        match outcome {
            Outcome::TransportError { message } => {
                assert!(message.ends_with("..."));
                assert!(message.len() < 250);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_is_malformed() {
        let outcome = classify(response(200, "not json at all"));
        assert!(matches!(outcome, Outcome::Malformed { .. }));
    }

    #[test]
    fn io_failure_is_transport() {
        let outcome = classify(Err("connection refused".to_string()));
        match outcome {
            Outcome::TransportError { message } => {
                assert!(message.starts_with("Network error: connection refused"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}

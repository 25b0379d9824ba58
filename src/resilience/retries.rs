//! Attempt outcome classification.
//!
//! # Responsibilities
//! - Turn a raw transport result into success, retriable, rate-limited or fatal
//! - Recognise provider throttling (HTTP 429 or a throttling JSON-RPC code)
//!
//! # Design Decisions
//! - JSON-RPC errors in the body win over the HTTP status
//! - Parse errors and invalid requests are the caller's fault: fatal, no fallback
//! - Any other JSON-RPC error may be endpoint-specific and is retried elsewhere

use serde_json::Value;

use crate::rpc::error::AttemptError;
use crate::rpc::transport::{HttpReply, TransportFailure};
use crate::rpc::types::{JsonRpcErrorObject, JsonRpcResponse};

pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// JSON-RPC codes for requests no endpoint can serve.
pub const FATAL_RPC_CODES: [i64; 2] = [-32700, -32600];

const RATE_LIMIT_PHRASES: [&str; 2] = ["rate limit", "too many requests"];

/// Classified result of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(Value),
    RateLimited(AttemptError),
    Retriable(AttemptError),
    Fatal(AttemptError),
}

impl AttemptOutcome {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::RateLimited(_) => "rate_limited",
            AttemptOutcome::Retriable(_) => "failure",
            AttemptOutcome::Fatal(_) => "fatal",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    rate_limit_codes: Vec<i64>,
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self::new(vec![-32005])
    }
}

impl OutcomeClassifier {
    pub fn new(rate_limit_codes: Vec<i64>) -> Self {
        Self { rate_limit_codes }
    }

    pub fn classify(&self, result: Result<HttpReply, TransportFailure>) -> AttemptOutcome {
        match result {
            Ok(reply) => self.classify_reply(&reply),
            Err(TransportFailure::Timeout(limit)) => AttemptOutcome::Retriable(AttemptError::Timeout(limit)),
            Err(TransportFailure::Connection(message)) => {
                AttemptOutcome::Retriable(AttemptError::Transport(message))
            }
        }
    }

    fn classify_reply(&self, reply: &HttpReply) -> AttemptOutcome {
        if reply.status == HTTP_TOO_MANY_REQUESTS {
            return AttemptOutcome::RateLimited(AttemptError::RateLimited("HTTP 429".to_string()));
        }

        let response: JsonRpcResponse = match serde_json::from_slice(&reply.body) {
            Ok(response) => response,
            Err(_) if !reply.is_success() => {
                return AttemptOutcome::Retriable(AttemptError::HttpStatus(reply.status));
            }
            Err(e) => return AttemptOutcome::Retriable(AttemptError::InvalidResponse(e.to_string())),
        };

        if let Some(error) = response.error {
            return self.classify_rpc_error(error);
        }
        if !reply.is_success() {
            return AttemptOutcome::Retriable(AttemptError::HttpStatus(reply.status));
        }
        match response.result {
            Some(result) => AttemptOutcome::Success(result),
            None => AttemptOutcome::Retriable(AttemptError::InvalidResponse(
                "response has neither result nor error".to_string(),
            )),
        }
    }

    fn classify_rpc_error(&self, error: JsonRpcErrorObject) -> AttemptOutcome {
        if self.is_rate_limit(&error) {
            return AttemptOutcome::RateLimited(AttemptError::RateLimited(format!(
                "JSON-RPC {}: {}",
                error.code, error.message
            )));
        }

        let attempt_error = AttemptError::Rpc {
            code: error.code,
            message: error.message,
        };
        if FATAL_RPC_CODES.contains(&error.code) {
            AttemptOutcome::Fatal(attempt_error)
        } else {
            AttemptOutcome::Retriable(attempt_error)
        }
    }

    fn is_rate_limit(&self, error: &JsonRpcErrorObject) -> bool {
        if self.rate_limit_codes.contains(&error.code) {
            return true;
        }
        let message = error.message.to_ascii_lowercase();
        RATE_LIMIT_PHRASES.iter().any(|phrase| message.contains(phrase))
    }
}

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// These are the only errors that are fatal: the binary reports them and exits.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Discord bot token not found")]
    #[diagnostic(
        code(esquie::config::missing_token),
        help(
            "Set DISCORD_BOT_TOKEN in the environment or in a .env file next to the binary, \
             or add `token` under [discord] in {config_path}"
        )
    )]
    MissingToken { config_path: String },

    #[error("Configuration file could not be read")]
    #[diagnostic(
        code(esquie::config::unreadable),
        help("Check that {path} exists and is readable")
    )]
    Unreadable {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("Failed to parse configuration")]
    #[diagnostic(
        code(esquie::config::parse_failed),
        help("Check TOML syntax and field types in {path}")
    )]
    ParseFailed {
        path: String,
        #[source]
        cause: toml::de::Error,
    },

    #[error("Invalid configuration value for {field}")]
    #[diagnostic(code(esquie::config::invalid), help("{reason}"))]
    Invalid { field: String, reason: String },
}

/// Failure of the hosted completion API.
///
/// Every variant collapses into the same user-facing apology; the variants
/// exist so the log line says what actually went wrong.
#[derive(Error, Diagnostic, Debug)]
pub enum AiError {
    #[error("Completion request failed")]
    #[diagnostic(
        code(esquie::ai::request_failed),
        help("Could not reach {endpoint}; check network connectivity")
    )]
    RequestFailed {
        endpoint: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("Completion request timed out after {timeout_secs}s")]
    #[diagnostic(
        code(esquie::ai::timeout),
        help("The completion service at {endpoint} is slow or overloaded")
    )]
    Timeout { endpoint: String, timeout_secs: u64 },

    #[error("Completion service returned HTTP {status}")]
    #[diagnostic(code(esquie::ai::bad_status), help("Response body: {body}"))]
    BadStatus { status: u16, body: String },

    #[error("Malformed completion response")]
    #[diagnostic(
        code(esquie::ai::malformed_response),
        help("Expected choices[0].message.content in the response: {reason}")
    )]
    MalformedResponse { reason: String },

    #[error("Completion response was empty")]
    #[diagnostic(code(esquie::ai::empty_response))]
    EmptyResponse,
}

impl AiError {
    pub(crate) fn from_reqwest(endpoint: &str, timeout_secs: u64, cause: reqwest::Error) -> Self {
        if cause.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
                timeout_secs,
            }
        } else if cause.is_decode() {
            Self::MalformedResponse {
                reason: cause.to_string(),
            }
        } else {
            Self::RequestFailed {
                endpoint: endpoint.to_string(),
                cause,
            }
        }
    }
}

/// Failure reported by the chat platform for a single operation.
///
/// Adapters classify their native errors into these buckets so that the
/// delivery chain and the history walk can decide what to do without knowing
/// about the platform's error types.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Missing permissions for {operation}")]
    #[diagnostic(
        code(esquie::platform::forbidden),
        help("Grant the bot the permission needed to {operation} in this channel")
    )]
    Forbidden { operation: String },

    #[error("Message not found")]
    #[diagnostic(
        code(esquie::platform::not_found),
        help("Message {message_id} was deleted or is not visible to the bot")
    )]
    NotFound { message_id: u64 },

    #[error("Platform operation {operation} failed: {reason}")]
    #[diagnostic(code(esquie::platform::other))]
    Other { operation: String, reason: String },
}

impl PlatformError {
    pub fn forbidden(operation: impl Into<String>) -> Self {
        Self::Forbidden {
            operation: operation.into(),
        }
    }

    pub fn other(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Other {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure is a permission problem that a different delivery
    /// route might not have.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

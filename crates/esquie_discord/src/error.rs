use esquie_core::PlatformError;
use miette::Diagnostic;
use serenity::http::HttpError;
use serenity::model::ModelError;
use thiserror::Error;

/// Startup and gateway failures. These end the process.
#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("Discord authentication failed")]
    #[diagnostic(
        code(esquie::discord::auth_failed),
        help("Check that your Discord bot token is valid and has not been regenerated")
    )]
    AuthenticationFailed {
        #[source]
        cause: serenity::Error,
        token_preview: String, // First/last few chars of token for debugging
    },

    #[error("Failed to build Discord client")]
    #[diagnostic(code(esquie::discord::client_build_failed))]
    ClientBuild {
        #[source]
        cause: serenity::Error,
    },

    #[error("Gateway connection failed")]
    #[diagnostic(
        code(esquie::discord::gateway_failed),
        help(
            "Enable the Message Content intent for the bot in the Discord Developer Portal \
             and check network connectivity"
        )
    )]
    Gateway {
        #[source]
        cause: serenity::Error,
    },
}

pub type Result<T> = std::result::Result<T, DiscordError>;

impl DiscordError {
    pub fn auth_failed(cause: serenity::Error, token: &str) -> Self {
        Self::AuthenticationFailed {
            cause,
            token_preview: token_preview(token),
        }
    }
}

/// Show the first 6 and last 4 characters of a token
fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

/// Map a serenity failure onto the platform error classes the delivery chain
/// understands.
pub fn classify(error: serenity::Error, operation: &str, message_id: Option<u64>) -> PlatformError {
    match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => classify_status(
            response.status_code.as_u16(),
            operation,
            message_id,
            &response.error.message,
        ),
        serenity::Error::Model(ModelError::InvalidPermissions { .. }) => {
            PlatformError::forbidden(operation)
        }
        _ => PlatformError::other(operation, &error),
    }
}

pub(crate) fn classify_status(
    status: u16,
    operation: &str,
    message_id: Option<u64>,
    reason: &str,
) -> PlatformError {
    match (status, message_id) {
        (403, _) => PlatformError::forbidden(operation),
        (404, Some(message_id)) => PlatformError::NotFound { message_id },
        _ => PlatformError::other(operation, format!("HTTP {status}: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_auth_error_hides_token() {
        let fake_error = serenity::Error::Other("test");
        let error = DiscordError::auth_failed(
            fake_error,
            "MTE2MzU5NzE0MjQ5NzI1NTQyNA.GqvKfH.verysecrettoken",
        );

        if let DiscordError::AuthenticationFailed { token_preview, .. } = &error {
            assert_eq!(token_preview, "MTE2Mz...oken");
            assert!(!token_preview.contains("secret"));
        }

        let output = format!("{:?}", Report::new(error));
        assert!(output.contains("auth_failed"));
    }

    #[test]
    fn test_short_token_is_fully_masked() {
        assert_eq!(token_preview("abc"), "***");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(403, "edit message", Some(5), "Missing Permissions"),
            PlatformError::forbidden("edit message")
        );
        assert_eq!(
            classify_status(404, "fetch message", Some(5), "Unknown Message"),
            PlatformError::NotFound { message_id: 5 }
        );
        assert!(matches!(
            classify_status(404, "send message", None, "Unknown Channel"),
            PlatformError::Other { .. }
        ));
        assert!(!classify_status(429, "reply", Some(5), "rate limited").is_permission());
    }

    #[test]
    fn test_other_serenity_errors_are_not_permission_class() {
        let error = classify(serenity::Error::Other("gateway closed"), "reply", None);
        assert!(matches!(
            error,
            PlatformError::Other { ref reason, .. } if reason == "gateway closed"
        ));
    }
}

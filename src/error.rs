//! Error types for geminichat.
//!
//! One error enum covers both halves of the system: the session store and
//! controller on the client side, and the chat bridge and provider client on
//! the server side.  Provider failures are reduced to an [`ErrorCategory`] by
//! [`classify`] before they are shown to a user.

use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

/// The main error type for geminichat.
#[derive(Clone, Debug)]
pub enum Error {
    /// Neither a prompt nor an image was supplied.
    EmptyInput,

    /// A session index did not refer to a session in the collection.
    OutOfRange {
        /// The index that was requested.
        index: usize,
        /// The number of sessions at the time of the request.
        len: usize,
    },

    /// The provider answered but the answer carried no usable text.
    EmptyProviderReply,

    /// The provider reported a rate or quota limit.
    RateLimited {
        /// Human-readable error message.
        message: String,
    },

    /// The provider reported that it is overloaded or unavailable.
    Unavailable {
        /// Human-readable error message.
        message: String,
    },

    /// Any other provider failure.
    Unknown {
        /// Human-readable error message.
        message: String,
    },

    /// The HTTP call between client and server could not complete.
    Transport {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A non-success status returned by the provider API.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Canonical reason phrase for the status code, if any.
        reason: Option<String>,
        /// Error message reported by the provider.
        message: String,
    },

    /// Missing or unusable credentials.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid configuration value.
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Image decoding, resizing, or encoding failed.
    Image {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Encoding/decoding error (base64, UTF-8).
    Encoding {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// HTTP client error talking to the provider.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }

    /// Creates a new rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Error::RateLimited {
            message: message.into(),
        }
    }

    /// Creates a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Error::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Error::Unknown {
            message: message.into(),
        }
    }

    /// Creates a new transport error.
    pub fn transport(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new API error.
    pub fn api(status_code: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            reason,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new image error.
    pub fn image(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Image {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new encoding error.
    pub fn encoding(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Encoding {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Returns true if this error is an empty-input error.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Error::EmptyInput)
    }

    /// Returns true if this error is a session indexing error.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }

    /// Returns true if this error is related to rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Returns true if this error is a client/server transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "Empty input: no prompt or image supplied"),
            Error::OutOfRange { index, len } => {
                write!(f, "Session index {index} out of range (sessions: {len})")
            }
            Error::EmptyProviderReply => write!(f, "Provider returned no text"),
            Error::RateLimited { message } => write!(f, "Rate limited: {message}"),
            Error::Unavailable { message } => write!(f, "Service unavailable: {message}"),
            Error::Unknown { message } => write!(f, "{message}"),
            Error::Transport { message, .. } => write!(f, "Transport error: {message}"),
            Error::Api {
                status_code,
                reason,
                message,
            } => {
                if let Some(reason) = reason {
                    write!(f, "[{status_code} {reason}] {message}")
                } else {
                    write!(f, "[{status_code}] {message}")
                }
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::Configuration { message } => {
                write!(f, "Configuration error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Image { message, .. } => write!(f, "Image error: {message}"),
            Error::Encoding { message, .. } => write!(f, "Encoding error: {message}"),
            Error::Io { message, .. } => write!(f, "I/O error: {message}"),
            Error::Url { message, .. } => write!(f, "URL error: {message}"),
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport { source, .. }
            | Error::Serialization { source, .. }
            | Error::Image { source, .. }
            | Error::Encoding { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::encoding(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::encoding(format!("base64 error: {err}"), Some(Box::new(err)))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::image(err.to_string(), Some(Box::new(err)))
    }
}

/// A specialized Result type for geminichat operations.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////// classify //////////////////////////////////////////////

/// User-facing category of a bridge failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Neither a prompt nor an image.
    EmptyInput,
    /// The provider answered with nothing.
    EmptyProviderReply,
    /// Rate or quota exhausted.
    RateLimited,
    /// Provider overloaded.
    Unavailable,
    /// Everything else.
    Unknown,
}

impl ErrorCategory {
    /// The biometrics/logging label for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::EmptyInput => "empty_input",
            ErrorCategory::EmptyProviderReply => "empty_provider_reply",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

/// Message shown when neither a prompt nor an image was supplied.
pub const EMPTY_INPUT_MESSAGE: &str = "⚠️ Please enter a message or attach an image.";
/// Message shown when the provider produced no text.
pub const EMPTY_REPLY_MESSAGE: &str = "⚠️ No response. You may have hit a usage limit or quota.";
/// Message shown when the provider reports a rate or quota limit.
pub const RATE_LIMITED_MESSAGE: &str =
    "⚠️ Quota limit reached. Try again later or use another API key.";
/// Message shown when the provider is overloaded.
pub const UNAVAILABLE_MESSAGE: &str = "⚠️ Gemini is overloaded. Try again soon.";

// Evaluated top to bottom; the first rule with a matching needle wins.  The
// provider does not publish stable error codes, so this is text matching.
const CLASSIFICATION_RULES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::RateLimited, &["quota", "exceeded", "429"]),
    (
        ErrorCategory::Unavailable,
        &["overloaded", "unavailable", "503"],
    ),
];

/// Classify raw provider error text into a category.
pub fn classify_text(text: &str) -> ErrorCategory {
    let text = text.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|needle| text.contains(needle)))
        .map(|(category, _)| *category)
        .unwrap_or(ErrorCategory::Unknown)
}

/// Classify an error into a category.
pub fn classify(err: &Error) -> ErrorCategory {
    match err {
        Error::EmptyInput => ErrorCategory::EmptyInput,
        Error::EmptyProviderReply => ErrorCategory::EmptyProviderReply,
        Error::RateLimited { .. } => ErrorCategory::RateLimited,
        Error::Unavailable { .. } => ErrorCategory::Unavailable,
        Error::Unknown { .. } => ErrorCategory::Unknown,
        other => classify_text(&other.to_string()),
    }
}

/// The fixed user-facing text for an error.
///
/// Only the `Unknown` category carries the original error detail.
pub fn user_message(err: &Error) -> String {
    match classify(err) {
        ErrorCategory::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
        ErrorCategory::EmptyProviderReply => EMPTY_REPLY_MESSAGE.to_string(),
        ErrorCategory::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
        ErrorCategory::Unavailable => UNAVAILABLE_MESSAGE.to_string(),
        ErrorCategory::Unknown => format!("❌ Gemini error: {}", unknown_detail(err)),
    }
}

fn unknown_detail(err: &Error) -> String {
    match err {
        Error::Unknown { message } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_text() {
        let err = Error::api(
            429,
            Some("Too Many Requests".to_string()),
            "Resource has been exhausted",
        );
        assert_eq!(classify(&err), ErrorCategory::RateLimited);
        assert_eq!(user_message(&err), RATE_LIMITED_MESSAGE);
        assert_eq!(
            classify_text("You exceeded your current quota"),
            ErrorCategory::RateLimited
        );
    }

    #[test]
    fn unavailable_text() {
        let err = Error::api(
            503,
            Some("Service Unavailable".to_string()),
            "The model is overloaded.",
        );
        assert_eq!(classify(&err), ErrorCategory::Unavailable);
        assert_eq!(user_message(&err), UNAVAILABLE_MESSAGE);
        assert_eq!(classify_text("MODEL OVERLOADED"), ErrorCategory::Unavailable);
    }

    #[test]
    fn rules_evaluated_in_order() {
        // Both rule sets match; the rate limit rule comes first.
        assert_eq!(
            classify_text("429 while the service was overloaded"),
            ErrorCategory::RateLimited
        );
    }

    #[test]
    fn unknown_embeds_detail() {
        let err = Error::unknown("API key not valid");
        assert_eq!(classify(&err), ErrorCategory::Unknown);
        assert_eq!(user_message(&err), "❌ Gemini error: API key not valid");

        let err = Error::api(400, Some("Bad Request".to_string()), "bad field");
        assert_eq!(
            user_message(&err),
            "❌ Gemini error: [400 Bad Request] bad field"
        );
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(user_message(&Error::EmptyInput), EMPTY_INPUT_MESSAGE);
        assert_eq!(user_message(&Error::EmptyProviderReply), EMPTY_REPLY_MESSAGE);
    }

    #[test]
    fn display_out_of_range() {
        let err = Error::out_of_range(5, 2);
        assert!(err.is_out_of_range());
        assert_eq!(err.to_string(), "Session index 5 out of range (sessions: 2)");
    }

    #[test]
    fn api_status_code() {
        let err = Error::api(500, None, "boom");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.to_string(), "[500] boom");
        assert_eq!(Error::EmptyInput.status_code(), None);
    }
}

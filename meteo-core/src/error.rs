use std::time::Duration;

use thiserror::Error;

/// Failure of a single HTTP lookup. Carries the offending URL and, where one
/// was received, the raw response body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}: {}", truncate_body(.body))]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {url}: {source}; body: {}", truncate_body(.body))]
    Parse {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }

    /// Raw response body, when the server answered at all.
    pub fn body(&self) -> Option<&str> {
        match self {
            FetchError::Transport { .. } => None,
            FetchError::Status { body, .. } | FetchError::Parse { body, .. } => Some(body),
        }
    }
}

/// Failure of one location strategy: device or IP geolocation, or an empty history.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("No recent search to reuse")]
    NoRecentSearch,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service not supported on this host")]
    Unsupported,

    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),

    #[error("IP location lookup failed: {0}")]
    Lookup(#[from] FetchError),
}

/// Errors surfaced to the caller of [`crate::WeatherApp`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Geolocation(#[from] LocationError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Fixed message to show the user in place of the weather display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Vă rugăm să introduceți numele unui oraș",
            AppError::Fetch(_) => {
                "Nu am putut obține datele meteo. Verificați numele orașului și încercați din nou."
            }
            AppError::Geolocation(_) => {
                "Nu am putut obține locația dvs. Vă rugăm să căutați manual un oraș."
            }
            AppError::Storage(_) => "Nu am putut salva preferințele locale.",
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

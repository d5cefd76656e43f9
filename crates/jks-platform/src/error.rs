use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image is {size} bytes; the limit is {max}")]
    ImageTooLarge { size: usize, max: usize },

    #[error("upload body is empty")]
    EmptyUpload,

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

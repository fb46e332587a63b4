use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for {provider}")]
    MissingApiKey { provider: String },

    #[error("request to {provider} failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {message}")]
    HttpStatus {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("failed to parse {provider} response: {message}")]
    ResponseParse { provider: String, message: String },

    #[error("{provider} returned no usable content")]
    EmptyResponse { provider: String },
}

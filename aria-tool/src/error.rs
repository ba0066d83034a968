use thiserror::Error;

#[derive(Debug, Error)]
pub enum AriaError {
    #[error("API key not found. Set ANTHROPIC_API_KEY or configure ~/.config/aria/config.toml")]
    ApiKeyNotFound,

    #[error("Locked. Pass --password or set ARIA_PASSWORD")]
    Locked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] aria_cal::StoreError),
}

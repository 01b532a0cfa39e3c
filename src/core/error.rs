use thiserror::Error;

/// Errors from the outbound Telegram side of the service
///
/// Lower layers keep their own narrow error enums (`StoreError`, `AuthError`).
///
/// # Example
///
/// ```no_run
/// use tgvault::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     log::error!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Input or response that cannot be used as is
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

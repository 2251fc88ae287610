use thiserror::Error;

// === StorageError ===

/// Errors raised by a key-value store adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the store past its byte budget.
    #[error("Storage quota exceeded: {requested} bytes requested, {available} available")]
    QuotaExceeded { requested: usize, available: usize },
    /// The backing database rejected the operation.
    #[error("Storage database error: {0}")]
    DatabaseError(String),
    /// The store could not be opened or reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true when the failure is the quota condition, the only one the
    /// history store recovers from by evicting records.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DiskFull =>
            {
                StorageError::QuotaExceeded {
                    requested: 0,
                    available: 0,
                }
            }
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}

// === HistoryError ===

/// Errors surfaced by the history store. Persistence failures are not among
/// them: those are logged and reported through `PersistOutcome`.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The value handed to `add` is not a self-contained data URL.
    #[error("Invalid history image: {0}")]
    InvalidImage(String),
}

// === DataUrlError ===

/// Errors related to parsing `data:` URLs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Not a data URL: missing 'data:' scheme")]
    MissingScheme,
    #[error("Malformed data URL: missing ',' separator")]
    MissingSeparator,
    #[error("Unsupported data URL encoding: {0}")]
    NotBase64(String),
    #[error("Invalid data URL payload: {0}")]
    InvalidPayload(String),
}

// === CropError ===

/// Errors related to producing a cropped image.
#[derive(Debug, Error)]
pub enum CropError {
    /// Displayed or natural dimensions are zero, negative, or not finite.
    #[error("Invalid crop dimensions: {0}")]
    InvalidDimensions(String),
    /// The scaled rectangle covers no pixels of the source image.
    #[error("Crop region is empty: {0}")]
    EmptyRegion(String),
    /// The source image could not be decoded.
    #[error("Failed to decode source image: {0}")]
    Decode(String),
    /// Encoding the cropped raster failed or produced no data.
    #[error("Failed to encode cropped image: {0}")]
    Encoding(String),
    /// The source data URL was malformed.
    #[error("Invalid source data URL: {0}")]
    DataUrl(#[from] DataUrlError),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ClipboardError ===

/// Errors related to the system clipboard.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard is reachable (headless session, missing display server).
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    /// The clipboard holds no image.
    #[error("Clipboard does not contain an image")]
    NoImage,
    /// Reading or writing the image failed.
    #[error("Clipboard transfer failed: {0}")]
    Transfer(String),
}

// PasteCrop services
// Services provide stateless or configuration-level functionality: cropping,
// data URL encoding, clipboard access and settings.

#[cfg(feature = "clipboard")]
pub mod clipboard;
pub mod crop_transform;
pub mod data_url;
pub mod settings_engine;

//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `convert` - Audio upload and voice conversion
//! - `home` - Upload form with the cached voice list

pub mod api;
pub mod convert;
pub mod home;

pub use convert::convert_voice;
pub use home::get_home;

//! View-facing state shared by every frontend.

pub mod notifications;

pub use notifications::{Toast, ToastLevel, ToastQueue, MAX_TOASTS, SHARE_ERROR_DURATION_MS};

#[doc(hidden)]
pub use tracing as __tracing;

/// Target used for positive outcomes so the terminal formatter can mark them apart from plain info.
pub const SUCCESS_TARGET: &str = "nanowatch::success";

/// Logs a completed action at INFO level under [`SUCCESS_TARGET`].
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::log::__tracing::info!(target: "nanowatch::success", $($arg)*)
    };
}

//! System clipboard integration.

/// Copy plain text to the system clipboard.
///
/// Returns whether the copy succeeded. Clipboard failure is non-fatal and
/// never affects the verification state; callers surface it as a notice.
pub fn copy_plain_text(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to write to clipboard");
                false
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "Clipboard unavailable");
            false
        }
    }
}

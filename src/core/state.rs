//! Process-wide shutdown state.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::cancel::CancelToken;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Root token handed to the processor, cancelled by Ctrl+C
static ROOT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// The root cancellation token for this process.
pub fn root_token() -> CancelToken {
    ROOT_TOKEN.get_or_init(CancelToken::new).clone()
}

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The first Ctrl+C cancels the root token so in-flight work drains;
/// a second one exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<CancelToken> {
    let token = root_token();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("capture"; "cancelling...");
        handler_token.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(token)
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

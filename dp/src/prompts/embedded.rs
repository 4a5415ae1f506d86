//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Oracle classification prompt (task-type catalog + `task_type|confidence` protocol)
pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");

/// Plan enhancer prompt (KEEP-biased section review)
pub const ENHANCE: &str = include_str!("../../prompts/enhance.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "classify" => Some(CLASSIFY),
        "enhance" => Some(ENHANCE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

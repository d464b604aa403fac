//! The opaque platform-URL resolver collaborator (spec §6).

use crate::ir::error::LowerError;

/// Resolves a platform URL (e.g. `dx://project-xxxx:record-yyyy`) naming a
/// docker image asset to its record id. Synchronous and opaque to the IR
/// generator -- production wiring to the real platform client is out of
/// scope here.
pub trait DxUrlResolver {
    fn resolve(&self, url: &str) -> Result<String, LowerError>;
}

/// A resolver that always fails, used by tests that never exercise the
/// DxAsset docker path.
pub struct NullDxUrlResolver;

impl DxUrlResolver for NullDxUrlResolver {
    fn resolve(&self, url: &str) -> Result<String, LowerError> {
        Err(LowerError::PlatformResolution {
            pos: crate::error::SourcePosition::new(
                String::new(),
                String::new(),
                0,
                0,
                0,
                0,
            ),
            url: url.to_string(),
            message: "no platform resolver configured".to_string(),
        })
    }
}

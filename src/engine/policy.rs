//! Safety policy for generated code.
//!
//! A textual filter, not a semantic one: the verdict is "unsafe" iff
//! any denylisted substring occurs anywhere in the lowercased source,
//! whether in a real call, a string literal, or a comment. It is a
//! visible line of defense, not a security boundary: string
//! concatenation or alternate APIs walk straight past it, and plain
//! file I/O is deliberately permitted.

use tracing::{debug, warn};

/// Patterns denoting process/environment escape primitives.
///
/// Fixed by contract: downstream exercises depend on this exact list,
/// gaps included. Deployments that want a different list set
/// `[engine] denylist` in the config instead of editing this.
pub const DEFAULT_DENYLIST: &[&str] = &["os.environ", "subprocess", "getenv", "system(", "popen"];

/// Fixed reason surfaced to the caller when code is rejected.
pub const REJECTION_REASON: &str =
    "code rejected: it tries to access environment variables or other unsafe operations";

/// Substring denylist applied to generated code before execution.
pub struct SafetyPolicy {
    denylist: Vec<String>,
}

impl SafetyPolicy {
    /// Builds a policy from a pattern list. Patterns are lowercased so
    /// matching stays case-insensitive regardless of config spelling.
    pub fn new(denylist: &[String]) -> Self {
        Self {
            denylist: denylist.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Returns true if `code` contains none of the denylisted
    /// substrings. Case-insensitive, context-free.
    pub fn permits(&self, code: &str) -> bool {
        let lowered = code.to_lowercase();
        for pattern in &self.denylist {
            if lowered.contains(pattern.as_str()) {
                warn!("Generated code rejected: contains denylisted pattern {pattern:?}");
                debug!("Rejected code was: {code}");
                return false;
            }
        }
        true
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

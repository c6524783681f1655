//! Key and channel naming for progress state in a shared key space.

use crate::domain::foundation::CycleId;

/// Default namespace for progress keys.
pub const DEFAULT_KEY_PREFIX: &str = "chat2edit:progress:";

/// Builds the log key and pub/sub channel name for a cycle.
///
/// Cycle ids cannot contain `:`, so a log key never collides with
/// the `channel:` sub-namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressKeys {
    prefix: String,
}

impl ProgressKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key of the cycle's event list.
    pub fn log_key(&self, cycle_id: &CycleId) -> String {
        format!("{}{}", self.prefix, cycle_id)
    }

    /// Pub/sub channel carrying the cycle's live events.
    pub fn channel(&self, cycle_id: &CycleId) -> String {
        format!("{}channel:{}", self.prefix, cycle_id)
    }
}

impl Default for ProgressKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_use_progress_namespace() {
        let keys = ProgressKeys::default();
        let id = CycleId::parse("c1").unwrap();
        assert_eq!(keys.log_key(&id), "chat2edit:progress:c1");
        assert_eq!(keys.channel(&id), "chat2edit:progress:channel:c1");
    }

    #[test]
    fn custom_prefix_is_applied() {
        let keys = ProgressKeys::new("test:");
        let id = CycleId::parse("abc").unwrap();
        assert_eq!(keys.log_key(&id), "test:abc");
        assert_eq!(keys.channel(&id), "test:channel:abc");
    }
}

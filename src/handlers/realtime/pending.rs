//! Outstanding tool calls for one session.

use dashmap::DashMap;

/// Tool calls sent to the client and not yet answered, keyed by call ID.
///
/// Written by the upstream pump when it forwards a `command.invoke` and by
/// the downstream pump when the matching `command.result` arrives.
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: DashMap<String, String>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call about to be sent to the client.
    ///
    /// Returns `false` if the call ID was already outstanding; the stored
    /// name is replaced in that case.
    pub fn register(&self, call_id: &str, name: &str) -> bool {
        self.calls
            .insert(call_id.to_string(), name.to_string())
            .is_none()
    }

    /// Forget a call whose invoke could not be delivered.
    pub fn unregister(&self, call_id: &str) {
        self.calls.remove(call_id);
    }

    /// Take the call answered by a result, returning the tool name it was issued for.
    pub fn resolve(&self, call_id: &str) -> Option<String> {
        self.calls.remove(call_id).map(|(_, name)| name)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let pending = PendingCalls::new();
        assert!(pending.register("call_1", "clearCanvas"));
        assert_eq!(pending.len(), 1);

        assert_eq!(pending.resolve("call_1").as_deref(), Some("clearCanvas"));
        assert!(pending.is_empty());
        assert_eq!(pending.resolve("call_1"), None);
    }

    #[test]
    fn test_duplicate_register() {
        let pending = PendingCalls::new();
        assert!(pending.register("call_1", "clearCanvas"));
        assert!(!pending.register("call_1", "paintCanvas"));
        assert_eq!(pending.resolve("call_1").as_deref(), Some("paintCanvas"));
    }

    #[test]
    fn test_unregister() {
        let pending = PendingCalls::new();
        pending.register("call_1", "getCanvasSize");
        pending.unregister("call_1");
        pending.unregister("missing");
        assert!(pending.is_empty());
    }
}

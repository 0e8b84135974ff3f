use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use crate::event::{Event, GenericEvent};

/// A listener on the host event bus.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Hook identifier
    fn id(&self) -> &str;
    /// Get the topics this hook is interested in
    fn topics(&self) -> &[&str];

    async fn on_event(&self, e: &GenericEvent) -> Result<()>;
}

/// Topic-indexed hook registry, the host's event bus.
///
/// Emitting is fire-and-forget: a failing hook is logged and never fails the
/// emitter.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook under every topic it declares
    pub fn add_hook(&mut self, hook: Arc<dyn Hook>) {
        for &topic in hook.topics() {
            self.hooks
                .entry(topic.to_string())
                .or_default()
                .push(hook.clone());
        }
    }

    /// Remove a hook by its ID from every topic
    pub fn remove_hook(&mut self, hook_id: &str) -> Result<()> {
        let mut found = false;
        for hooks_list in self.hooks.values_mut() {
            let before = hooks_list.len();
            hooks_list.retain(|h| h.id() != hook_id);
            found |= hooks_list.len() != before;
        }

        if found {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Hook not found: {}", hook_id))
        }
    }

    /// Number of hooks listening on `topic`
    pub fn hook_count(&self, topic: &str) -> usize {
        self.hooks.get(topic).map_or(0, Vec::len)
    }

    /// Deliver an event to every hook on its topic, in registration order.
    /// Returns how many hooks handled it successfully.
    pub async fn emit<E: Event>(&self, event: &E) -> usize {
        let Some(hooks) = self.hooks.get(event.topic()) else {
            return 0;
        };

        let generic_event = event.to_generic_event();
        let mut delivered = 0;
        for hook in hooks {
            match hook.on_event(&generic_event).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Hook '{}' failed on '{}': {}",
                    hook.id(),
                    generic_event.topic,
                    e
                ),
            }
        }
        delivered
    }
}

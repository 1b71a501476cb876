//! Wrapper targets: decorate exactly one child.

use std::any::Any;
use std::str::FromStr;

use crate::error::PropertyError;
use crate::properties::{coerce, find_kind, is_member, Configurable, PropertyKind};
use crate::targets::{SharedTarget, Target, TargetShape};

/// What a bounded queue or buffer does when it fills up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowAction {
    /// Drop the oldest pending events.
    #[default]
    Discard,
    /// Grow past the configured bound.
    Grow,
    /// Block the writer until space frees up.
    Block,
    /// Flush the pending events downstream.
    Flush,
}

impl FromStr for OverflowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("discard") {
            Ok(OverflowAction::Discard)
        } else if name.eq_ignore_ascii_case("grow") {
            Ok(OverflowAction::Grow)
        } else if name.eq_ignore_ascii_case("block") {
            Ok(OverflowAction::Block)
        } else if name.eq_ignore_ascii_case("flush") {
            Ok(OverflowAction::Flush)
        } else {
            Err(format!(
                "unknown overflow action '{name}', expected discard, grow, block or flush"
            ))
        }
    }
}

/// Decouples writers from a slow child through a bounded queue.
///
/// Also injected automatically around every top-level target when the
/// `targets` section carries `async = true`.
#[derive(Debug)]
pub struct AsyncQueueWrapper {
    name: Option<String>,
    wrapped: Option<SharedTarget>,
    queue_limit: usize,
    batch_size: usize,
    overflow_action: OverflowAction,
}

impl Default for AsyncQueueWrapper {
    fn default() -> Self {
        AsyncQueueWrapper {
            name: None,
            wrapped: None,
            queue_limit: 10_000,
            batch_size: 200,
            overflow_action: OverflowAction::Discard,
        }
    }
}

impl AsyncQueueWrapper {
    pub fn queue_limit(&self) -> usize {
        self.queue_limit
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn overflow_action(&self) -> OverflowAction {
        self.overflow_action
    }
}

impl Configurable for AsyncQueueWrapper {
    fn type_name(&self) -> &'static str {
        "async_queue"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("queue_limit", PropertyKind::Text),
                ("batch_size", PropertyKind::Text),
                ("overflow_action", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "queue_limit") {
            self.queue_limit = coerce(name, value)?;
        } else if is_member(name, "batch_size") {
            self.batch_size = coerce(name, value)?;
        } else if is_member(name, "overflow_action") {
            self.overflow_action = coerce(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for AsyncQueueWrapper {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Wrapper
    }

    fn wrapped(&self) -> Option<&SharedTarget> {
        self.wrapped.as_ref()
    }

    fn set_wrapped(&mut self, child: SharedTarget) {
        self.wrapped = Some(child);
    }
}

/// Collects events and forwards them downstream in batches.
#[derive(Debug)]
pub struct BufferingWrapper {
    name: Option<String>,
    wrapped: Option<SharedTarget>,
    buffer_size: usize,
    flush_timeout_ms: u64,
    overflow_action: OverflowAction,
}

impl Default for BufferingWrapper {
    fn default() -> Self {
        BufferingWrapper {
            name: None,
            wrapped: None,
            buffer_size: 100,
            flush_timeout_ms: 0,
            overflow_action: OverflowAction::Flush,
        }
    }
}

impl BufferingWrapper {
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn flush_timeout_ms(&self) -> u64 {
        self.flush_timeout_ms
    }

    pub fn overflow_action(&self) -> OverflowAction {
        self.overflow_action
    }
}

impl Configurable for BufferingWrapper {
    fn type_name(&self) -> &'static str {
        "buffering"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("buffer_size", PropertyKind::Text),
                ("flush_timeout_ms", PropertyKind::Text),
                ("overflow_action", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "buffer_size") {
            self.buffer_size = coerce(name, value)?;
        } else if is_member(name, "flush_timeout_ms") {
            self.flush_timeout_ms = coerce(name, value)?;
        } else if is_member(name, "overflow_action") {
            self.overflow_action = coerce(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for BufferingWrapper {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Wrapper
    }

    fn wrapped(&self) -> Option<&SharedTarget> {
        self.wrapped.as_ref()
    }

    fn set_wrapped(&mut self, child: SharedTarget) {
        self.wrapped = Some(child);
    }
}

/// Re-attempts delivery to the child a bounded number of times.
#[derive(Debug)]
pub struct RetryWrapper {
    name: Option<String>,
    wrapped: Option<SharedTarget>,
    retry_count: u32,
    retry_delay_ms: u64,
}

impl Default for RetryWrapper {
    fn default() -> Self {
        RetryWrapper {
            name: None,
            wrapped: None,
            retry_count: 3,
            retry_delay_ms: 100,
        }
    }
}

impl RetryWrapper {
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }
}

impl Configurable for RetryWrapper {
    fn type_name(&self) -> &'static str {
        "retry"
    }

    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        find_kind(
            name,
            &[
                ("name", PropertyKind::Text),
                ("retry_count", PropertyKind::Text),
                ("retry_delay_ms", PropertyKind::Text),
            ],
        )
    }

    fn set_text(&mut self, name: &str, value: &str) -> Result<(), PropertyError> {
        if is_member(name, "name") {
            self.name = Some(value.to_string());
        } else if is_member(name, "retry_count") {
            self.retry_count = coerce(name, value)?;
        } else if is_member(name, "retry_delay_ms") {
            self.retry_delay_ms = coerce(name, value)?;
        } else {
            return Err(PropertyError::unknown(name));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Target for RetryWrapper {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn shape(&self) -> TargetShape {
        TargetShape::Wrapper
    }

    fn wrapped(&self) -> Option<&SharedTarget> {
        self.wrapped.as_ref()
    }

    fn set_wrapped(&mut self, child: SharedTarget) {
        self.wrapped = Some(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::builtin::NullTarget;
    use std::sync::Arc;

    #[test]
    fn overflow_action_parse() {
        assert_eq!("Block".parse::<OverflowAction>(), Ok(OverflowAction::Block));
        assert_eq!("GROW".parse::<OverflowAction>(), Ok(OverflowAction::Grow));
        assert!("explode".parse::<OverflowAction>().is_err());
    }

    #[test]
    fn wrapper_holds_exactly_one_child() {
        let mut wrapper = BufferingWrapper::default();
        assert!(wrapper.wrapped().is_none());
        wrapper.set_wrapped(Arc::new(NullTarget::default()));
        assert!(wrapper.wrapped().is_some());
    }

    #[test]
    fn async_queue_members_coerce_from_text() {
        let mut wrapper = AsyncQueueWrapper::default();
        wrapper.set_text("queue_limit", "500").unwrap();
        wrapper.set_text("overflow_action", "block").unwrap();
        assert_eq!(wrapper.queue_limit(), 500);
        assert_eq!(wrapper.overflow_action(), OverflowAction::Block);
    }
}

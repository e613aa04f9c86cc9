//! Message trait for action payloads carried by effects.
//!
//! Effects are repeatable descriptions of work, so anything they deliver must be
//! cloneable and shareable across the threads a runtime may run them on.
//! [`Message`] names that bound once; it is implemented for every eligible type.

use std::any::type_name;

/// Payload that can travel through an [`Effect`](crate::effects::Effect) to an
/// [`Address`](crate::effects::Address).
pub trait Message: Clone + Send + Sync + 'static {
    /// Human-readable name for this message type, for logging.
    fn message_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<T: Clone + Send + Sync + 'static> Message for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Increment,
    }

    fn assert_message<T: Message>(_: &T) {}

    #[test]
    fn plain_types_are_messages() {
        assert_message(&1_u32);
        assert_message(&String::from("hello"));
        assert_message(&Action::Increment);
    }

    #[test]
    fn message_name_is_type_name() {
        assert!(Action::Increment.message_name().ends_with("Action"));
        assert_eq!(7_i64.message_name(), "i64");
    }
}

//! Hit event model for asynchronous hit counting.

/// A successful resolution waiting to be counted.
///
/// Sent from [`crate::application::services::ResolutionService`] to the
/// background worker through a bounded channel, so redirects never wait on
/// the counter update.
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub code: String,
}

impl HitEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_event_creation() {
        let event = HitEvent::new("abc1234");

        assert_eq!(event.code, "abc1234");
    }

    #[test]
    fn test_hit_event_clone() {
        let event = HitEvent::new(String::from("code1"));
        let cloned = event.clone();

        assert_eq!(cloned, event);
    }
}

use crate::audit::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;

/// Unit-of-work engine configuration
#[derive(Clone)]
pub struct EngineConfig {
    /// Install the `updated_at` flush listener
    pub touch_updated_timestamp: bool,

    /// Time source for audit stamps
    pub clock: Arc<dyn Clock>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            touch_updated_timestamp: true,
            clock: Arc::new(SystemClock),
        }
    }

    /// Enable or disable the `updated_at` flush listener
    pub fn touch_updated_timestamp(mut self, enabled: bool) -> Self {
        self.touch_updated_timestamp = enabled;
        self
    }

    /// Set the clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("touch_updated_timestamp", &self.touch_updated_timestamp)
            .finish_non_exhaustive()
    }
}

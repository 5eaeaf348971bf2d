use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Creation/modification instants of an audited entity.
///
/// Either stamp may be unloaded when the entity was built from a partial row.
/// `created_at` never changes after construction and `updated_at` never goes
/// below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditStamps {
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AuditStamps {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Stamps as loaded from storage, `None` for a stamp the row did not
    /// carry. An `updated_at` older than `created_at` is raised to `created_at`.
    pub fn restore(created_at: Option<DateTime<Utc>>, updated_at: Option<DateTime<Utc>>) -> Self {
        let updated_at = match (created_at, updated_at) {
            (Some(created), Some(updated)) => Some(updated.max(created)),
            (_, updated) => updated,
        };
        Self {
            created_at,
            updated_at,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Moves `updated_at` to `now`, or one microsecond past its previous
    /// value when the clock has not advanced (or went backwards). An unloaded
    /// `updated_at` becomes loaded. At the end of the representable range the
    /// stamp stays where it is.
    pub fn touch(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut next = now;
        if let Some(previous) = self.updated_at {
            let floor = previous
                .checked_add_signed(Duration::microseconds(1))
                .unwrap_or(previous);
            next = next.max(floor);
        }
        if let Some(created) = self.created_at {
            next = next.max(created);
        }
        self.updated_at = Some(next);
        next
    }
}

/// Source of "now" for audit stamping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

//! Time sources for event timestamps.
//!
//! The `time` section selects how the runtime stamps events: local or UTC,
//! and either exact ("accurate") or cached to whole-second resolution
//! ("fast"). The compiler only constructs and installs the source.

use std::any::Any;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};

use crate::error::PropertyError;
use crate::properties::{Configurable, PropertyKind};

/// Supplies the current timestamp to the execution runtime.
pub trait TimeSource: Configurable + fmt::Debug {
    fn now(&self) -> DateTime<FixedOffset>;
}

macro_rules! empty_configurable {
    ($ty:ty, $name:literal) => {
        impl Configurable for $ty {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn property_kind(&self, _name: &str) -> Option<PropertyKind> {
                None
            }

            fn set_text(&mut self, name: &str, _value: &str) -> Result<(), PropertyError> {
                Err(PropertyError::unknown(name))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }
    };
}

/// Exact local time on every call.
#[derive(Debug, Default)]
pub struct AccurateLocal;

impl TimeSource for AccurateLocal {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

empty_configurable!(AccurateLocal, "accurate_local");

/// Exact UTC time on every call.
#[derive(Debug, Default)]
pub struct AccurateUtc;

impl TimeSource for AccurateUtc {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }
}

empty_configurable!(AccurateUtc, "accurate_utc");

/// Local time cached per second.
#[derive(Debug, Default)]
pub struct FastLocal {
    cached: Mutex<Option<(i64, DateTime<FixedOffset>)>>,
}

impl TimeSource for FastLocal {
    fn now(&self) -> DateTime<FixedOffset> {
        cached_second(&self.cached, || Local::now().fixed_offset())
    }
}

empty_configurable!(FastLocal, "fast_local");

/// UTC time cached per second.
#[derive(Debug, Default)]
pub struct FastUtc {
    cached: Mutex<Option<(i64, DateTime<FixedOffset>)>>,
}

impl TimeSource for FastUtc {
    fn now(&self) -> DateTime<FixedOffset> {
        cached_second(&self.cached, || Utc::now().fixed_offset())
    }
}

empty_configurable!(FastUtc, "fast_utc");

/// Alias for the platform clock without caching.
#[derive(Debug, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

empty_configurable!(SystemTime, "system");

fn cached_second(
    cell: &Mutex<Option<(i64, DateTime<FixedOffset>)>>,
    clock: impl Fn() -> DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    let now = clock();
    let second = now.timestamp();
    let mut guard = match cell.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some((cached_second, cached)) = *guard {
        if cached_second == second {
            return cached;
        }
    }
    let truncated = now.with_nanosecond(0).unwrap_or(now);
    *guard = Some((second, truncated));
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_sources_truncate_to_whole_seconds() {
        let source = FastUtc::default();
        let stamp = source.now();
        assert_eq!(stamp.nanosecond(), 0);
    }

    #[test]
    fn fast_sources_are_stable_within_a_second() {
        let source = FastLocal::default();
        let a = source.now();
        let b = source.now();
        assert!(b >= a);
        assert!(b.timestamp() - a.timestamp() <= 1);
    }

    #[test]
    fn time_sources_have_no_settable_members() {
        let mut source = AccurateUtc;
        assert!(source.set_text("zone", "CET").is_err());
        assert_eq!(source.property_kind("zone"), None);
    }
}

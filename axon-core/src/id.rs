//! Typed ID wrappers for task, future, and semaphore handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up task ids, future ids, etc.
/// These are plain `u64`s underneath, allocated monotonically by the
/// machine for each run. They carry no meaning across runs.
macro_rules! numeric_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a typed ID from a raw index.
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// The raw index.
            pub fn index(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(TaskId, "Unique identifier for a task within one run.");
numeric_id!(
    FutureId,
    "Unique identifier for a task's completion future within one run."
);
numeric_id!(SemaphoreId, "Unique identifier for a semaphore within one run.");

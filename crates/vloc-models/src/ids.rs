//! Integer id newtypes for persisted records.
//!
//! Ids are allocated monotonically by the store; the newtypes exist so a
//! segment id can never be passed where a video id is expected.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw integer value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a video.
    VideoId
);
define_id!(
    /// Unique identifier for a transcription segment.
    SegmentId
);
define_id!(
    /// Unique identifier for a translation row.
    TranslationId
);
define_id!(
    /// Unique identifier for a dubbing job.
    DubbingJobId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = VideoId::from(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Ordering/equality only applies within one id type.
        let a = SegmentId(1);
        let b = SegmentId(2);
        assert!(a < b);
    }
}

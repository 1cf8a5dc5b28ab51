//! Integer identifiers for every catalogue entity.
//!
//! Entities reference each other exclusively through these keys; lookups are
//! resolved against the owning [`crate::Form`].

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from its raw integer representation.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw integer representation of the identifier.
            pub const fn as_raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`crate::Form`].
    FormId
);
entity_id!(
    /// Identifier of a [`crate::Point`].
    PointId
);
entity_id!(
    /// Identifier of a [`crate::Parameter`].
    ParameterId
);
entity_id!(
    /// Identifier of a [`crate::Track`].
    TrackId
);
entity_id!(
    /// Identifier of a [`crate::Puzzle`].
    PuzzleId
);
entity_id!(
    /// Identifier of a catalogue [`crate::BaseClass`].
    ClassId
);
entity_id!(
    /// Identifier of an argument, input or output declared on a [`crate::BaseClass`].
    DeclId
);
entity_id!(
    /// Identifier of an [`crate::Exemplar`] within one run.
    ExemplarId
);

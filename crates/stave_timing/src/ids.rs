//! Opaque ID newtypes for timing and design entities.
//!
//! All IDs are thin `u32` wrappers used as arena indices. They are `Copy`,
//! `Hash`, `Ord` (so pin sets iterate deterministically), and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the ID as an arena index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Timing-engine handle of a pin (an instance terminal or a top-level port).
    PinId
);

define_id!(
    /// Handle of a cell instance in the design database.
    InstanceId
);

define_id!(
    /// Handle of a net in the design database.
    NetId
);

define_id!(
    /// Handle of an analysis corner.
    CornerId
);

define_id!(
    /// Handle of an edge in the reference timing graph.
    TimingEdgeId
);

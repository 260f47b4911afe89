//! Value-level diffing between successive channel snapshots.
//!
//! Channel monitoring stores the last observed value per `(scope, channel)`
//! and needs the difference when a new snapshot arrives. The rules are
//! shape-directed and pure:
//!
//! - **Objects**: shallow diff of added and changed keys.
//! - **Arrays**: the new tail past the previously stored length.
//! - **Anything else**: the new value when it differs.
//!
//! `apply`-style machinery is deliberately absent: the processor never
//! mutates state, it only observes successive snapshots the runtime owns.
//!
//! ```
//! use serde_json::json;
//! use weir_state::diff_values;
//!
//! let prev = json!({"count": 1, "label": "a"});
//! let next = json!({"count": 2, "label": "a"});
//! assert_eq!(diff_values(Some(&prev), &next), Some(json!({"count": 2})));
//! ```

mod diff;

pub use diff::{diff_values, new_items};

//! Identifier bound shared by state ids and event ids.

use std::fmt::Debug;
use std::hash::Hash;

/// Key used to name states and events.
///
/// Anything cheap to clone, hashable and thread-safe qualifies: `&'static str`,
/// `String`, integers, or fieldless enums generated with [`id_enum!`].
///
/// [`id_enum!`]: crate::id_enum
pub trait Id: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Id for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Render an id for error messages and log fields.
pub(crate) fn label<T: Id>(id: &T) -> String {
    format!("{id:?}")
}

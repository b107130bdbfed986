//! Decoding helpers shared by the inbound wire records.

use serde::{Deserialize, Deserializer};

/// Decodes an optional field, treating an explicit `null` like a missing one.
///
/// Pair with `#[serde(default)]` so absent fields also fall back to
/// `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//! Structural encode/decode of query metadata.
//!
//! The only contract of the encoding is round-trip equality: decoding what
//! [`encode`] produced yields a value equal to the original. The byte layout
//! is JSON today and is not part of the contract.
//!
//! Persistability is a static property. Every type reachable from
//! [`QueryMetadata`](crate::metadata::QueryMetadata) implements
//! [`Persistable`], and the assertions at the bottom of this module fail to
//! compile if a field ever stops doing so.

use std::any::type_name;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{QueryError, Result};

/// Pure data that survives an encode/decode round trip.
///
/// Blanket-implemented; a type holding a handle, lock, or callback cannot
/// satisfy it.
pub trait Persistable: Serialize + DeserializeOwned + Clone + PartialEq + Debug {}

impl<T> Persistable for T where T: Serialize + DeserializeOwned + Clone + PartialEq + Debug {}

/// Encodes a value.
///
/// # Errors
///
/// Returns [`QueryError::SerializationFailure`] naming `T` if the value
/// cannot be represented (for example a non-finite float).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes =
        serde_json::to_vec(value).map_err(|e| QueryError::serialization::<T>(e.to_string()))?;
    debug!(type_name = type_name::<T>(), len = bytes.len(), "encoded value");
    Ok(bytes)
}

/// Encodes a value in human-readable form.
///
/// # Errors
///
/// Same as [`encode`].
pub fn encode_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| QueryError::serialization::<T>(e.to_string()))?;
    debug!(type_name = type_name::<T>(), len = bytes.len(), "encoded value (pretty)");
    Ok(bytes)
}

/// Decodes a value produced by [`encode`] or [`encode_pretty`].
///
/// # Errors
///
/// Returns [`QueryError::SerializationFailure`] naming `T` if the input is
/// malformed or violates a value constraint (for example a negative limit).
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let value =
        serde_json::from_slice(bytes).map_err(|e| QueryError::serialization::<T>(e.to_string()))?;
    debug!(type_name = type_name::<T>(), len = bytes.len(), "decoded value");
    Ok(value)
}

/// Encodes then decodes a value.
///
/// # Errors
///
/// Propagates failures of [`encode`] and [`decode`].
pub fn round_trip<T: Persistable>(value: &T) -> Result<T> {
    decode(&encode(value)?)
}

/// Checks that a value survives the round trip unchanged.
///
/// # Errors
///
/// Returns [`QueryError::SerializationFailure`] naming `T` if the round trip
/// fails or yields a different value.
pub fn audit_round_trip<T: Persistable>(value: &T) -> Result<()> {
    let decoded = round_trip(value)?;
    if &decoded == value {
        Ok(())
    } else {
        Err(QueryError::serialization::<T>(format!(
            "round trip changed the value: {value:?} became {decoded:?}"
        )))
    }
}

#[allow(dead_code)]
const fn assert_persistable<T: Persistable>() {}

// Every field type of the aggregate, recursively.
const _: () = {
    use crate::expr::{Expr, NullOrdering, Operator, OrderDirection, OrderSpecifier, Param, Path};
    use crate::flag::{FlagPayload, FlagPosition, JoinFlag, JoinFlagPosition, QueryFlag};
    use crate::join::{JoinExpression, JoinId, JoinRegistry, JoinType};
    use crate::metadata::QueryMetadata;
    use crate::modifiers::QueryModifiers;
    use crate::params::{ParamKey, ParamRegistry};
    use crate::value::SqlValue;

    assert_persistable::<QueryMetadata<Expr>>();
    assert_persistable::<Vec<QueryFlag<Expr>>>();
    assert_persistable::<QueryFlag<Expr>>();
    assert_persistable::<FlagPosition>();
    assert_persistable::<FlagPayload<Expr>>();
    assert_persistable::<JoinRegistry<Expr>>();
    assert_persistable::<JoinExpression<Expr>>();
    assert_persistable::<JoinId>();
    assert_persistable::<JoinType>();
    assert_persistable::<JoinFlag<Expr>>();
    assert_persistable::<JoinFlagPosition>();
    assert_persistable::<QueryModifiers>();
    assert_persistable::<Vec<OrderSpecifier<Expr>>>();
    assert_persistable::<OrderDirection>();
    assert_persistable::<NullOrdering>();
    assert_persistable::<ParamRegistry>();
    assert_persistable::<ParamKey>();
    assert_persistable::<SqlValue>();
    assert_persistable::<Option<Expr>>();
    assert_persistable::<Vec<Expr>>();
    assert_persistable::<Operator>();
    assert_persistable::<Param>();
    assert_persistable::<Path>();
};

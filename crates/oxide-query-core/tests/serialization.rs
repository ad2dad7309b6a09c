//! Round-trip tests for the persisted form of query metadata.

mod common;
use common::*;

use oxide_query_core::codec::{self, audit_round_trip, decode, encode, encode_pretty};
use oxide_query_core::expr::{NullOrdering, Operator, OrderDirection};
use oxide_query_core::flag::{FlagPayload, JoinFlagPosition};
use oxide_query_core::join::JoinRegistry;
use oxide_query_core::params::ParamRegistry;
use oxide_query_core::{
    Expr, JoinFlag, JoinType, ParamKey, QueryError, QueryFlag, QueryMetadata, QueryModifiers,
    SqlValue, param, path,
};

#[test]
fn populated_metadata_round_trips() {
    let metadata = populated();
    let bytes = encode(&metadata).unwrap();
    let decoded: QueryMetadata = decode(&bytes).unwrap();
    assert_same_clauses(&metadata, &decoded);
    assert_eq!(metadata, decoded);
}

#[test]
fn pretty_encoding_round_trips() {
    let metadata = populated();
    let decoded: QueryMetadata = decode(&encode_pretty(&metadata).unwrap()).unwrap();
    assert_eq!(metadata, decoded);
}

#[test]
fn empty_metadata_round_trips() {
    audit_round_trip(&QueryMetadata::new()).unwrap();
}

#[test]
fn params_and_toggles_round_trip() {
    let mut metadata = populated();
    metadata
        .add_where([path("id").eq(param("id").bind(42))])
        .unwrap();
    metadata
        .add_projection([path("blob").eq(param("raw").bind(vec![0_u8, 255]))])
        .unwrap();
    metadata.set_param(ParamKey::from("ratio"), SqlValue::Float(0.1));
    metadata.set_distinct(true);
    metadata.set_unique(true);
    let decoded = codec::round_trip(&metadata).unwrap();
    assert_same_clauses(&metadata, &decoded);
}

#[test]
fn decoded_metadata_keeps_current_join() {
    let mut metadata = populated();
    metadata.add_join(JoinType::Left, path("other"));
    let mut decoded = codec::round_trip(&metadata).unwrap();

    decoded
        .add_join_condition([path("other.id").is_not_null()])
        .unwrap();
    metadata
        .add_join_condition([path("other.id").is_not_null()])
        .unwrap();
    assert_eq!(decoded, metadata);
}

#[test]
fn every_field_type_passes_audit() {
    let metadata = populated();
    let join = metadata.current_join().unwrap().clone();

    audit_round_trip(&metadata).unwrap();
    audit_round_trip(&metadata.flags().to_vec()).unwrap();
    audit_round_trip(&metadata.group_by().to_vec()).unwrap();
    audit_round_trip(&metadata.having().cloned()).unwrap();
    audit_round_trip(metadata.joins()).unwrap();
    audit_round_trip(&join).unwrap();
    audit_round_trip(&join.flags().to_vec()).unwrap();
    audit_round_trip(&metadata.modifiers()).unwrap();
    audit_round_trip(&metadata.order_by().to_vec()).unwrap();
    audit_round_trip(metadata.params()).unwrap();
    audit_round_trip(&metadata.projection().to_vec()).unwrap();
    audit_round_trip(&metadata.where_clause().cloned()).unwrap();
    audit_round_trip(&metadata.is_distinct()).unwrap();

    audit_round_trip(&JoinRegistry::<Expr>::new()).unwrap();
    audit_round_trip(&ParamRegistry::new()).unwrap();
    audit_round_trip(&QueryModifiers::default()).unwrap();
    audit_round_trip(&QueryModifiers::offset_only(3).unwrap()).unwrap();
    audit_round_trip(&JoinFlag::<Expr>::at(
        JoinFlagPosition::End,
        FlagPayload::Expr(path("x")),
    ))
    .unwrap();
    audit_round_trip(&QueryFlag::<Expr>::new(
        oxide_query_core::FlagPosition::With,
        "cte",
    ))
    .unwrap();
    audit_round_trip(&path("id").desc().nulls_first()).unwrap();
    audit_round_trip(&NullOrdering::Last).unwrap();
    audit_round_trip(&OrderDirection::Desc).unwrap();
    audit_round_trip(&Operator::IsNotEmpty).unwrap();
    audit_round_trip(&JoinType::Full).unwrap();
    audit_round_trip(&ParamKey::from("k")).unwrap();
}

#[test]
fn every_value_kind_round_trips() {
    for value in [
        SqlValue::Null,
        SqlValue::Bool(false),
        SqlValue::Int(i64::MIN),
        SqlValue::Float(-1.5e-300),
        SqlValue::Text(String::from("quote ' and \" and \\")),
        SqlValue::Blob(Vec::new()),
    ] {
        audit_round_trip(&value).unwrap();
    }
}

#[test]
fn negative_limit_cannot_be_decoded() {
    let metadata = populated();
    let mut value = serde_json::to_value(&metadata).unwrap();
    value["modifiers"]["limit"] = serde_json::json!(-1);
    let bytes = serde_json::to_vec(&value).unwrap();
    let err = decode::<QueryMetadata>(&bytes).unwrap_err();
    match err {
        QueryError::SerializationFailure { type_name, .. } => {
            assert!(type_name.contains("QueryMetadata"), "{type_name}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn truncated_input_is_rejected() {
    let bytes = encode(&populated()).unwrap();
    let err = decode::<QueryMetadata>(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, QueryError::SerializationFailure { .. }));
}

#[test]
fn long_predicate_chains_round_trip() {
    let mut metadata = QueryMetadata::new();
    metadata.add_join(JoinType::Inner, path("other"));
    for i in 0..600_i64 {
        let column = format!("c{i}");
        metadata.add_where([path(&column).is_null()]).unwrap();
        metadata.add_having([path(&column).is_not_empty()]).unwrap();
        metadata
            .add_join_condition([path(&column).eq(param(&column).bind(i))])
            .unwrap();
    }
    audit_round_trip(&metadata).unwrap();

    let decoded: QueryMetadata = decode(&encode_pretty(&metadata).unwrap()).unwrap();
    assert_same_clauses(&metadata, &decoded);
}

//! Tests for clause accumulation, predicate folding, joins, modifiers,
//! toggles and cloning.

mod common;
use common::*;

use oxide_query_core::flag::FlagPosition;
use oxide_query_core::{
    Expr, JoinExpression, JoinFlag, JoinType, OrderSpecifier, QueryError, QueryFlag, QueryMetadata,
    QueryModifiers, param, path,
};

#[test]
fn group_by_single() {
    let mut metadata = QueryMetadata::new();
    metadata.add_group_by([str_path()]).unwrap();
    assert_eq!(metadata.group_by(), &[str_path()]);
}

#[test]
fn group_by_keeps_call_order() {
    let mut metadata = QueryMetadata::new();
    metadata.add_group_by([path("a")]).unwrap();
    metadata.add_group_by([path("b")]).unwrap();
    metadata.add_group_by([path("a")]).unwrap();
    assert_eq!(metadata.group_by(), &[path("a"), path("b"), path("a")]);
}

#[test]
fn having_single() {
    let mut metadata = QueryMetadata::new();
    metadata.add_having([str_path().is_not_null()]).unwrap();
    assert_eq!(metadata.having(), Some(&str_path().is_not_null()));
}

#[test]
fn joins_single_default() {
    let mut metadata = QueryMetadata::new();
    metadata.add_join(JoinType::Default, str_path());
    assert_eq!(
        metadata.joins(),
        &vec![JoinExpression::new(JoinType::Default, str_path())]
    );
}

#[test]
fn joins_reflect_later_mutations() {
    let mut metadata = QueryMetadata::new();
    metadata.add_join(JoinType::Inner, path("a"));
    let before = metadata.joins().clone();
    metadata.add_join_flag(JoinFlag::new("")).unwrap();
    metadata
        .add_join_condition([path("a.id").is_not_null()])
        .unwrap();

    let join = metadata.joins().iter().next().unwrap();
    assert_eq!(join.flags(), &[JoinFlag::<Expr>::new("")]);
    assert_eq!(join.condition(), Some(&path("a.id").is_not_null()));
    assert_ne!(&before, metadata.joins());
}

#[test]
fn join_flags_are_separate_from_query_flags() {
    let mut metadata = QueryMetadata::new();
    metadata.add_join(JoinType::Left, path("a"));
    metadata.add_join_flag(JoinFlag::new("x")).unwrap();
    assert!(metadata.flags().is_empty());
    metadata.add_flag(QueryFlag::new(FlagPosition::Start, "y"));
    assert_eq!(metadata.current_join().unwrap().flags().len(), 1);
}

#[test]
fn join_condition_folds_per_join() {
    let mut metadata = QueryMetadata::new();
    metadata.add_join(JoinType::Inner, path("a"));
    metadata.add_join_condition([path("p").is_null()]).unwrap();
    metadata
        .add_join_condition([path("q").is_null(), path("r").is_null()])
        .unwrap();
    metadata.add_join(JoinType::Inner, path("b"));
    metadata.add_join_condition([path("s").is_null()]).unwrap();

    let conditions: Vec<Option<&Expr>> = metadata
        .joins()
        .iter()
        .map(JoinExpression::condition)
        .collect();
    let first = path("p")
        .is_null()
        .and(path("q").is_null())
        .and(path("r").is_null());
    assert_eq!(conditions, vec![Some(&first), Some(&path("s").is_null())]);
}

#[test]
fn modifiers_replaced_wholesale() {
    let mut metadata = QueryMetadata::new();
    let modifiers = QueryModifiers::new(Some(1), Some(2)).unwrap();
    metadata.set_modifiers(modifiers);
    assert_eq!(metadata.modifiers(), modifiers);
}

#[test]
fn set_limit_keeps_offset() {
    let mut metadata = QueryMetadata::new();
    metadata.set_modifiers(QueryModifiers::new(Some(1), Some(2)).unwrap());
    metadata.set_limit(3).unwrap();
    assert_eq!(metadata.modifiers().limit(), Some(3));
    assert_eq!(metadata.modifiers().offset(), Some(2));
}

#[test]
fn set_offset_keeps_limit() {
    let mut metadata = QueryMetadata::new();
    metadata.set_modifiers(QueryModifiers::new(Some(1), Some(1)).unwrap());
    metadata.set_offset(2).unwrap();
    assert_eq!(metadata.modifiers().limit(), Some(1));
    assert_eq!(metadata.modifiers().offset(), Some(2));
}

#[test]
fn set_limit_on_unrestricted() {
    let mut metadata = QueryMetadata::new();
    metadata.set_limit(5).unwrap();
    assert_eq!(metadata.modifiers(), QueryModifiers::limit_only(5).unwrap());
}

#[test]
fn order_by_keeps_call_order() {
    let mut metadata = QueryMetadata::new();
    metadata.add_order_by([str_path().asc()]).unwrap();
    metadata.add_order_by([str_path().desc()]).unwrap();
    assert_eq!(metadata.order_by(), &[str_path().asc(), str_path().desc()]);
}

#[test]
fn projection_multi_value() {
    let mut metadata = QueryMetadata::new();
    metadata
        .add_projection([str_path(), str_path().append("abc")])
        .unwrap();
    assert_eq!(
        metadata.projection(),
        &[str_path(), str_path().append("abc")]
    );
}

#[test]
fn where_multi_value_folds() {
    let mut metadata = QueryMetadata::new();
    metadata
        .add_where([str_path().eq("b"), str_path().is_not_empty()])
        .unwrap();
    assert_eq!(
        metadata.where_clause(),
        Some(&str_path().eq("b").and(str_path().is_not_empty()))
    );
}

#[test]
fn where_successive_calls_fold() {
    let mut metadata = QueryMetadata::new();
    metadata.add_where([str_path().eq("b")]).unwrap();
    metadata.add_where([str_path().is_not_empty()]).unwrap();
    assert_eq!(
        metadata.where_clause(),
        Some(&str_path().eq("b").and(str_path().is_not_empty()))
    );
}

#[test]
fn missing_argument_rejected_everywhere() {
    let mut metadata = QueryMetadata::new();
    let none: [Option<Expr>; 1] = [None];
    assert!(matches!(
        metadata.add_where(none.clone()),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        metadata.add_having(none.clone()),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        metadata.add_group_by(none.clone()),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        metadata.add_projection(none),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        metadata.add_order_by([None::<OrderSpecifier<Expr>>]),
        Err(QueryError::InvalidArgument(_))
    ));
    assert_eq!(metadata, QueryMetadata::new());
}

#[test]
fn failed_multi_value_call_appends_nothing() {
    let mut metadata = QueryMetadata::new();
    let result = metadata.add_projection([Some(path("a")), None, Some(path("b"))]);
    assert!(result.is_err());
    assert!(metadata.projection().is_empty());
}

#[test]
fn failed_call_registers_no_params() {
    let mut metadata = QueryMetadata::new();
    let bound = || Some(path("a").eq(param("p").bind(1)));
    assert!(metadata.add_where([bound(), None]).is_err());
    assert!(metadata.add_having([bound(), None]).is_err());
    assert!(metadata.add_group_by([bound(), None]).is_err());
    assert!(metadata.add_projection([bound(), None]).is_err());
    metadata.add_join(JoinType::Inner, path("t"));
    assert!(metadata.add_join_condition([bound(), None]).is_err());

    assert!(metadata.params().is_empty());
    assert!(metadata.where_clause().is_none());
    assert!(metadata.current_join().unwrap().condition().is_none());
}

#[test]
fn distinct_toggle() {
    let mut metadata = QueryMetadata::new();
    assert!(!metadata.is_distinct());
    metadata.set_distinct(true);
    assert!(metadata.is_distinct());
    assert!(!metadata.is_unique());
}

#[test]
fn unique_toggle() {
    let mut metadata = QueryMetadata::new();
    assert!(!metadata.is_unique());
    metadata.set_unique(true);
    assert!(metadata.is_unique());
    metadata.set_distinct(true);
    assert!(metadata.is_unique() && metadata.is_distinct());
}

#[test]
fn clone_equals_source() {
    let mut metadata = QueryMetadata::new();
    metadata.add_group_by([str_path()]).unwrap();
    metadata.add_having([str_path().is_not_null()]).unwrap();
    metadata.add_join(JoinType::Default, str_path());
    metadata.set_modifiers(QueryModifiers::new(Some(1), Some(2)).unwrap());
    metadata.add_order_by([str_path().asc()]).unwrap();
    metadata
        .add_projection([str_path(), str_path().append("abc")])
        .unwrap();
    metadata
        .add_where([str_path().eq("b"), str_path().is_not_empty()])
        .unwrap();

    let clone = metadata.clone();
    assert_same_clauses(&metadata, &clone);
    assert_eq!(metadata, clone);
}

#[test]
fn clone_is_independent() {
    let metadata = populated();
    let mut clone = metadata.clone();

    clone.add_where([path("extra").is_null()]).unwrap();
    clone.add_group_by([path("g")]).unwrap();
    clone.add_projection([path("p")]).unwrap();
    clone.add_order_by([path("o").desc()]).unwrap();
    clone.add_flag(QueryFlag::new(FlagPosition::End, "x"));
    clone.add_join_flag(JoinFlag::new("y")).unwrap();
    clone
        .add_join_condition([path("extra").is_not_null()])
        .unwrap();
    clone.set_limit(99).unwrap();
    clone.set_distinct(true);

    let fresh = populated();
    assert_same_clauses(&metadata, &fresh);
    assert_ne!(metadata, clone);
}

#[test]
fn source_mutation_invisible_to_clone() {
    let mut metadata = populated();
    let snapshot = metadata.clone();
    metadata.add_join(JoinType::Cross, path("other"));
    metadata.add_having([path("h").is_null()]).unwrap();
    assert_same_clauses(&snapshot, &populated());
}

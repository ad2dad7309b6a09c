#![allow(dead_code)]

use oxide_query_core::flag::FlagPosition;
use oxide_query_core::{Expr, JoinFlag, JoinType, QueryFlag, QueryMetadata, QueryModifiers, path};

pub fn str_path() -> Expr {
    path("str")
}

/// Metadata with every clause populated at least once.
pub fn populated() -> QueryMetadata {
    let expr = str_path();
    let mut metadata = QueryMetadata::new();
    metadata.add_flag(QueryFlag::new(FlagPosition::AfterFilters, ""));
    metadata.add_group_by([expr.clone()]).unwrap();
    metadata.add_having([expr.clone().is_empty()]).unwrap();
    metadata.add_join(JoinType::Default, expr.clone());
    metadata.add_join_flag(JoinFlag::new("")).unwrap();
    metadata
        .add_join_condition([expr.clone().is_empty()])
        .unwrap();
    metadata.add_order_by([expr.clone().asc()]).unwrap();
    metadata.add_projection([expr.clone()]).unwrap();
    metadata.add_where([expr.is_empty()]).unwrap();
    metadata.set_modifiers(QueryModifiers::new(Some(1), Some(2)).unwrap());
    metadata
}

/// Compares two metadata values accessor by accessor, so a failure names
/// the clause that differs.
pub fn assert_same_clauses(left: &QueryMetadata, right: &QueryMetadata) {
    assert_eq!(left.flags(), right.flags(), "flags");
    assert_eq!(left.group_by(), right.group_by(), "group by");
    assert_eq!(left.having(), right.having(), "having");
    assert_eq!(left.joins(), right.joins(), "joins");
    assert_eq!(left.modifiers(), right.modifiers(), "modifiers");
    assert_eq!(left.order_by(), right.order_by(), "order by");
    assert_eq!(left.params(), right.params(), "params");
    assert_eq!(left.projection(), right.projection(), "projection");
    assert_eq!(left.where_clause(), right.where_clause(), "where");
    assert_eq!(left.is_distinct(), right.is_distinct(), "distinct");
    assert_eq!(left.is_unique(), right.is_unique(), "unique");
}

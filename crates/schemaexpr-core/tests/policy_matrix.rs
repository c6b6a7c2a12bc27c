mod common;

use common::{load_table, parse};
use rstest::rstest;
use schemaexpr_core::{
    check_policy, ColumnDescriptor, ColumnId, Dialect, ExpressionKind, ForbiddenConstruct,
    PolicyChecker, SchemaExprError, ValidationOptions, ValidationPolicy,
};

fn violation(result: schemaexpr_core::Result<()>) -> Option<ForbiddenConstruct> {
    match result {
        Ok(()) => None,
        Err(SchemaExprError::PolicyViolation { construct, .. }) => Some(construct),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[rstest]
#[case::plain_comparison("qty > 0", None)]
#[case::subquery("qty IN (SELECT qty FROM orders)", Some(ForbiddenConstruct::Subquery))]
#[case::exists("EXISTS (SELECT 1)", Some(ForbiddenConstruct::Subquery))]
#[case::aggregate("max(qty) > 0", Some(ForbiddenConstruct::Aggregate))]
#[case::window_over("sum(qty) OVER () > 0", Some(ForbiddenConstruct::WindowFunction))]
#[case::window_builtin("row_number() > 1", Some(ForbiddenConstruct::WindowFunction))]
#[case::set_returning("unnest(qty) > 0", Some(ForbiddenConstruct::SetReturningFunction))]
#[case::volatile("random() > 0.5", Some(ForbiddenConstruct::VolatileFunction))]
#[case::stable("placed_at < now()", None)]
#[case::virtual_column("label <> ''", None)]
#[case::nested_in_case(
    "CASE WHEN qty > 0 THEN nextval('s') ELSE 0 END > 0",
    Some(ForbiddenConstruct::VolatileFunction)
)]
#[case::convert_of_subquery("CONVERT((SELECT 1), INT) > 0", Some(ForbiddenConstruct::Subquery))]
#[case::convert_of_volatile("CONVERT(random(), INT) > 0", Some(ForbiddenConstruct::VolatileFunction))]
#[case::convert_of_column("CONVERT(qty, INT) > 0", None)]
fn check_policy_matrix(#[case] sql: &str, #[case] expected: Option<ForbiddenConstruct>) {
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse(sql, Dialect::Generic);
    assert_eq!(
        violation(check_policy(&expr, &ValidationPolicy::CHECK, &orders, &options)),
        expected
    );
}

#[rstest]
#[case::stable("placed_at < now()", false, Some(ForbiddenConstruct::StableFunction))]
#[case::immutable("upper(status) = 'NEW'", false, None)]
#[case::virtual_strict("label = 'NEW'", false, Some(ForbiddenConstruct::VirtualColumnReference))]
#[case::virtual_supported("label = 'NEW'", true, None)]
#[case::stored_computed("total > 100", false, None)]
#[case::volatile("random() > 0.5", false, Some(ForbiddenConstruct::VolatileFunction))]
#[case::volatile_with_virtual("random() > 0.5", true, Some(ForbiddenConstruct::VolatileFunction))]
fn partial_index_policy_matrix(
    #[case] sql: &str,
    #[case] virtual_columns_supported: bool,
    #[case] expected: Option<ForbiddenConstruct>,
) {
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse(sql, Dialect::Generic);
    let policy = ValidationPolicy::partial_index(virtual_columns_supported);
    assert_eq!(
        violation(check_policy(&expr, &policy, &orders, &options)),
        expected
    );
}

#[rstest]
#[case::earlier_plain_column(6, "qty * 2", None)]
#[case::self_reference(6, "total + 1", Some(ForbiddenConstruct::SelfReference))]
#[case::later_computed(6, "upper(label)", Some(ForbiddenConstruct::ForwardReference))]
#[case::earlier_computed(7, "total > 0", None)]
#[case::new_column_reads_everything(9, "total + length(label)", None)]
#[case::stable(9, "now()", Some(ForbiddenConstruct::StableFunction))]
#[case::new_column_self_reference(9, "gross * 2", Some(ForbiddenConstruct::SelfReference))]
#[case::new_column_qualified_self_reference(
    9,
    "orders.GROSS - qty",
    Some(ForbiddenConstruct::SelfReference)
)]
fn computed_column_policy_matrix(
    #[case] target: u32,
    #[case] sql: &str,
    #[case] expected: Option<ForbiddenConstruct>,
) {
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse(sql, Dialect::Generic);
    // Ids missing from the snapshot stand for a column being added.
    let target = orders
        .column(ColumnId(target))
        .cloned()
        .unwrap_or_else(|| ColumnDescriptor::new(target, "gross", "numeric"));
    let checker =
        PolicyChecker::new(ValidationPolicy::COMPUTED_COLUMN, &orders, &options).with_target(&target);
    assert_eq!(violation(checker.check(&expr)), expected);
}

#[rstest]
#[case(ExpressionKind::Check)]
#[case(ExpressionKind::ComputedColumn)]
#[case(ExpressionKind::PartialIndex)]
fn every_policy_forbids_query_constructs(#[case] kind: ExpressionKind) {
    let policy = ValidationPolicy::for_kind(kind);
    assert_eq!(policy.kind(), kind);
    for construct in [
        ForbiddenConstruct::Subquery,
        ForbiddenConstruct::Aggregate,
        ForbiddenConstruct::WindowFunction,
        ForbiddenConstruct::SetReturningFunction,
        ForbiddenConstruct::VolatileFunction,
    ] {
        assert!(policy.forbids(construct), "{kind:?} should forbid {construct}");
    }
}

#[rstest]
fn query_constructs_rejected_under_every_policy(
    #[values(
        ExpressionKind::Check,
        ExpressionKind::ComputedColumn,
        ExpressionKind::PartialIndex
    )]
    kind: ExpressionKind,
    #[values(
        ("qty > (SELECT 1)", ForbiddenConstruct::Subquery),
        ("EXISTS (SELECT 1 FROM orders)", ForbiddenConstruct::Subquery),
        ("max(qty) > 0", ForbiddenConstruct::Aggregate),
        ("row_number() > 1", ForbiddenConstruct::WindowFunction),
        ("sum(qty) OVER () > 0", ForbiddenConstruct::WindowFunction),
        ("unnest(qty) > 0", ForbiddenConstruct::SetReturningFunction),
        ("random() > 0.5", ForbiddenConstruct::VolatileFunction),
        ("CONVERT(random(), INT) > 0", ForbiddenConstruct::VolatileFunction)
    )]
    case: (&str, ForbiddenConstruct),
) {
    let (sql, construct) = case;
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse(sql, Dialect::Generic);
    let policy = ValidationPolicy::for_kind(kind);
    assert_eq!(
        violation(check_policy(&expr, &policy, &orders, &options)),
        Some(construct),
        "{sql} under {kind:?}"
    );
}

#[rstest]
#[case::subscript("tags[1] = 'a'", Dialect::Generic, None)]
#[case::qualified_subscript("analytics.events.scores[2] > 0", Dialect::Generic, None)]
#[case::slice("cardinality(scores[1:2]) > 0", Dialect::Postgres, None)]
#[case::subquery_index("scores[(SELECT 1)] > 0", Dialect::Generic, Some(ForbiddenConstruct::Subquery))]
#[case::volatile_index(
    "scores[floor(random() * 3)] > 0",
    Dialect::Generic,
    Some(ForbiddenConstruct::VolatileFunction)
)]
#[case::aggregate_slice_bound(
    "cardinality(scores[1:max(id)]) > 0",
    Dialect::Postgres,
    Some(ForbiddenConstruct::Aggregate)
)]
#[case::subscript_of_subquery(
    "(SELECT ARRAY[1])[1] > 0",
    Dialect::Postgres,
    Some(ForbiddenConstruct::Subquery)
)]
#[case::convert_in_mysql(
    "CONVERT((SELECT 1), INT) > 0",
    Dialect::Mysql,
    Some(ForbiddenConstruct::Subquery)
)]
fn field_access_policy_matrix(
    #[case] sql: &str,
    #[case] dialect: Dialect,
    #[case] expected: Option<ForbiddenConstruct>,
) {
    let events = load_table("events");
    let options = ValidationOptions::new(dialect);
    let expr = parse(sql, dialect);
    assert_eq!(
        violation(check_policy(&expr, &ValidationPolicy::CHECK, &events, &options)),
        expected
    );
}

#[test]
fn unsupported_constructs_fail_closed() {
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse("MATCH (status) AGAINST ('new') AND qty > 0", Dialect::Generic);
    match check_policy(&expr, &ValidationPolicy::CHECK, &orders, &options) {
        Err(SchemaExprError::UnsupportedExpression { construct, path }) => {
            assert_eq!(construct, "MATCH ... AGAINST");
            assert_eq!(path.to_string(), "root.0");
        }
        other => panic!("expected an unsupported expression, got {other:?}"),
    }
}

#[test]
fn violation_reports_node_path() {
    let orders = load_table("orders");
    let options = ValidationOptions::default();
    let expr = parse("qty > 0 AND (status = 'x' OR random() > 0.5)", Dialect::Generic);
    let err = check_policy(&expr, &ValidationPolicy::CHECK, &orders, &options).unwrap_err();
    assert_eq!(err.node_path().map(|p| p.to_string()).as_deref(), Some("root.1.0.1.0"));
}

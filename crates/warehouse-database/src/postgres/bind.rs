//! Binding of rendered query plans onto sqlx queries.

use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;

use warehouse_core::types::{BindValue, QueryPlan};

/// Bind every placeholder value of `plan`, in order.
pub(crate) fn bind_plan<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    plan: &QueryPlan,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in plan.params() {
        query = match value {
            BindValue::Uuid(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
            BindValue::Timestamp(v) => query.bind(*v),
            BindValue::Integer(v) => query.bind(*v),
        };
    }
    query
}

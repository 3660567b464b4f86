//! Translation of a message filter into RediSearch query syntax.

use crate::index::SearchOptions;
use crate::messages::criteria::{FilterField, FilterValue, MessageFilter, SearchCriteria};

/// Query that matches every document in the index.
pub const MATCH_ALL: &str = "*";

/// Equality as a closed numeric range, e.g. `@deleted:[0 0]`.
pub fn predicate(field: FilterField, value: FilterValue) -> String {
    let value = match value {
        FilterValue::Int(v) => v,
        FilterValue::Bool(b) => i64::from(b),
    };
    format!("@{}:[{} {}]", field.attribute(), value, value)
}

pub fn to_index_params(filter: &MessageFilter) -> Vec<String> {
    filter
        .predicates()
        .into_iter()
        .map(|(field, value)| predicate(field, value))
        .collect()
}

/// Joins predicates with spaces (an implicit AND). No predicates means
/// [`MATCH_ALL`].
pub fn join_predicates(params: &[String]) -> String {
    if params.is_empty() {
        MATCH_ALL.to_string()
    } else {
        params.join(" ")
    }
}

pub fn to_index_query(filter: &MessageFilter) -> String {
    join_predicates(&to_index_params(filter))
}

pub fn search_options(criteria: &SearchCriteria) -> SearchOptions {
    SearchOptions {
        offset: 0,
        limit: criteria.limit,
        sort: criteria.order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::criteria::{build_criteria, CallerIdentity, Narrowing, Role, SortOrder};

    #[test]
    fn test_regular_caller_query() {
        let caller = CallerIdentity::new(5, Role::from_tag("user"));
        let criteria = build_criteria(42, None, None, Some(7), None, &caller);

        assert_eq!(
            to_index_params(&criteria.filter),
            vec!["@chatThreadId:[42 42]", "@userId:[7 7]", "@deleted:[0 0]"]
        );
        assert_eq!(
            to_index_query(&criteria.filter),
            "@chatThreadId:[42 42] @userId:[7 7] @deleted:[0 0]"
        );

        let options = search_options(&criteria);
        assert_eq!(options.offset, 0);
        assert_eq!(options.limit, 25);
        assert_eq!(options.sort, SortOrder::NEWEST_FIRST);
    }

    #[test]
    fn test_counterpart_and_true_flag() {
        let filter = MessageFilter {
            chat_thread_id: 3,
            narrowing: Some(Narrowing::Counterpart(11)),
            deleted: Some(true),
        };
        assert_eq!(
            to_index_query(&filter),
            "@chatThreadId:[3 3] @chatUserId:[11 11] @deleted:[1 1]"
        );
    }

    #[test]
    fn test_negative_ids_keep_native_form() {
        assert_eq!(
            predicate(FilterField::UserId, FilterValue::Int(-4)),
            "@userId:[-4 -4]"
        );
    }

    #[test]
    fn test_empty_predicates_match_all() {
        assert_eq!(join_predicates(&[]), MATCH_ALL);
    }
}

//! Filter, limit and sort descriptor shared by both message stores.

use serde::Deserialize;

pub const DEFAULT_LIMIT: u32 = 25;
pub const MAX_LIMIT: u32 = 1000;

/// Role tag resolved for the caller by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Api,
    Admin,
    Regular(String),
}

impl Role {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "api" => Role::Api,
            "admin" => Role::Admin,
            _ => Role::Regular(tag.to_string()),
        }
    }

    /// Exempt from limit capping and soft-delete filtering.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Api | Role::Admin)
    }

    pub fn reads_relational_store(&self) -> bool {
        matches!(self, Role::Api)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: i64,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

/// Body of a thread messages request. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRequest {
    pub limit: Option<u32>,
    pub only_own: Option<bool>,
    pub user_id: Option<i64>,
    pub chat_user_id: Option<i64>,
}

/// Restricts results to one author or one counterpart, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    Author(i64),
    Counterpart(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    ChatThreadId,
    UserId,
    ChatUserId,
    Deleted,
}

impl FilterField {
    /// Column name in the relational store.
    pub fn column(self) -> &'static str {
        match self {
            FilterField::ChatThreadId => "chat_thread_id",
            FilterField::UserId => "user_id",
            FilterField::ChatUserId => "chat_user_id",
            FilterField::Deleted => "deleted",
        }
    }

    /// Attribute name in the search index.
    pub fn attribute(self) -> &'static str {
        match self {
            FilterField::ChatThreadId => "chatThreadId",
            FilterField::UserId => "userId",
            FilterField::ChatUserId => "chatUserId",
            FilterField::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFilter {
    pub chat_thread_id: i64,
    pub narrowing: Option<Narrowing>,
    /// `Some(false)` hides soft-deleted messages.
    pub deleted: Option<bool>,
}

impl MessageFilter {
    /// Equality predicates in a fixed order: thread, narrowing, visibility.
    pub fn predicates(&self) -> Vec<(FilterField, FilterValue)> {
        let mut predicates = vec![(
            FilterField::ChatThreadId,
            FilterValue::Int(self.chat_thread_id),
        )];

        match self.narrowing {
            Some(Narrowing::Author(id)) => {
                predicates.push((FilterField::UserId, FilterValue::Int(id)))
            }
            Some(Narrowing::Counterpart(id)) => {
                predicates.push((FilterField::ChatUserId, FilterValue::Int(id)))
            }
            None => {}
        }

        if let Some(deleted) = self.deleted {
            predicates.push((FilterField::Deleted, FilterValue::Bool(deleted)));
        }

        predicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub const NEWEST_FIRST: SortOrder = SortOrder {
        field: SortField::CreatedAt,
        direction: SortDirection::Desc,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub filter: MessageFilter,
    pub limit: u32,
    pub order: SortOrder,
}

/// Builds the search descriptor for one thread read.
///
/// Narrowing precedence is `only_own`, then `user_id`, then `chat_user_id`.
/// Non-privileged callers get a capped limit and never see soft-deleted
/// messages.
pub fn build_criteria(
    thread_id: i64,
    limit: Option<u32>,
    only_own: Option<bool>,
    user_id: Option<i64>,
    chat_user_id: Option<i64>,
    caller: &CallerIdentity,
) -> SearchCriteria {
    let privileged = caller.is_privileged();

    let mut limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !privileged && limit > MAX_LIMIT {
        limit = MAX_LIMIT;
    }

    let narrowing = if only_own.unwrap_or(false) {
        Some(Narrowing::Author(caller.id))
    } else if let Some(user_id) = user_id {
        Some(Narrowing::Author(user_id))
    } else {
        chat_user_id.map(Narrowing::Counterpart)
    };

    SearchCriteria {
        filter: MessageFilter {
            chat_thread_id: thread_id,
            narrowing,
            deleted: if privileged { None } else { Some(false) },
        },
        limit,
        order: SortOrder::NEWEST_FIRST,
    }
}

impl SearchCriteria {
    pub fn from_request(thread_id: i64, request: &MessagesRequest, caller: &CallerIdentity) -> Self {
        build_criteria(
            thread_id,
            request.limit,
            request.only_own,
            request.user_id,
            request.chat_user_id,
            caller,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn regular(id: i64) -> CallerIdentity {
        CallerIdentity::new(id, Role::from_tag("user"))
    }

    #[test]
    fn test_role_tags() {
        assert_eq!(Role::from_tag("API"), Role::Api);
        assert_eq!(Role::from_tag(" admin "), Role::Admin);
        assert_eq!(Role::from_tag("member"), Role::Regular("member".to_string()));
        assert!(Role::Admin.is_privileged());
        assert!(!Role::Admin.reads_relational_store());
        assert!(Role::Api.reads_relational_store());
    }

    #[test]
    fn test_defaults_for_regular_caller() {
        let criteria = build_criteria(42, None, None, None, None, &regular(5));

        assert_eq!(criteria.limit, DEFAULT_LIMIT);
        assert_eq!(criteria.order, SortOrder::NEWEST_FIRST);
        assert_eq!(
            criteria.filter,
            MessageFilter {
                chat_thread_id: 42,
                narrowing: None,
                deleted: Some(false),
            }
        );
    }

    #[test]
    fn test_only_own_wins_over_user_id() {
        let criteria = build_criteria(42, None, Some(true), Some(7), Some(8), &regular(5));
        assert_eq!(criteria.filter.narrowing, Some(Narrowing::Author(5)));
    }

    #[test]
    fn test_user_id_wins_over_chat_user_id() {
        let criteria = build_criteria(42, None, Some(false), Some(7), Some(8), &regular(5));
        assert_eq!(criteria.filter.narrowing, Some(Narrowing::Author(7)));

        let criteria = build_criteria(42, None, None, None, Some(8), &regular(5));
        assert_eq!(criteria.filter.narrowing, Some(Narrowing::Counterpart(8)));
    }

    #[test]
    fn test_api_caller_only_own() {
        let api = CallerIdentity::new(3, Role::Api);
        let criteria = build_criteria(42, Some(5000), Some(true), None, None, &api);

        assert_eq!(criteria.limit, 5000);
        assert_eq!(
            criteria.filter.predicates(),
            vec![
                (FilterField::ChatThreadId, FilterValue::Int(42)),
                (FilterField::UserId, FilterValue::Int(3)),
            ]
        );
    }

    #[test]
    fn test_admin_bypasses_cap_and_soft_delete() {
        let admin = CallerIdentity::new(1, Role::Admin);
        let criteria = build_criteria(9, Some(2500), None, None, None, &admin);

        assert_eq!(criteria.limit, 2500);
        assert_eq!(criteria.filter.deleted, None);
    }

    #[test]
    fn test_predicate_order() {
        let criteria = build_criteria(42, None, None, None, Some(8), &regular(5));
        assert_eq!(
            criteria.filter.predicates(),
            vec![
                (FilterField::ChatThreadId, FilterValue::Int(42)),
                (FilterField::ChatUserId, FilterValue::Int(8)),
                (FilterField::Deleted, FilterValue::Bool(false)),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_regular_limit_is_capped(limit in any::<u32>()) {
            let criteria = build_criteria(1, Some(limit), None, None, None, &regular(2));
            if limit > MAX_LIMIT {
                prop_assert_eq!(criteria.limit, MAX_LIMIT);
            } else {
                prop_assert_eq!(criteria.limit, limit);
            }
        }

        #[test]
        fn prop_privileged_limit_passes_through(limit in any::<u32>(), api in any::<bool>()) {
            let role = if api { Role::Api } else { Role::Admin };
            let criteria = build_criteria(1, Some(limit), None, None, None, &CallerIdentity::new(2, role));
            prop_assert_eq!(criteria.limit, limit);
        }
    }
}

//! Single-result directory search.

use crate::{normalize::RawEntry, query::ResolvedQuery, session::LdapSession, Result};
use ldap_object_core::Error;
use tracing::debug;

/// Runs the resolved query once and returns the only entry it matched.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when nothing matched, [`Error::Ambiguous`] with
/// the match count when several entries did, and the session's own error
/// otherwise.
pub async fn search(session: &mut dyn LdapSession, query: &ResolvedQuery) -> Result<RawEntry> {
    debug!(
        location = %query.location,
        scope = %query.scope,
        filter = %query.filter,
        "searching directory"
    );
    let mut entries = session
        .search(&query.location, query.scope, &query.filter)
        .await?;
    debug!(count = entries.len(), "directory search returned");

    match entries.len() {
        0 => Err(Error::NotFound(format!(
            "no entry under `{}` matches `{}` ({} scope)",
            query.location, query.filter, query.scope
        ))),
        1 => Ok(entries.remove(0)),
        count => Err(Error::Ambiguous { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SearchScope, MATCH_ALL_FILTER};
    use crate::session::MockLdapSession;

    fn query() -> ResolvedQuery {
        ResolvedQuery {
            location: "dc=example,dc=com".to_string(),
            scope: SearchScope::SingleLevel,
            filter: "(objectClass=person)".to_string(),
        }
    }

    fn entries(count: usize) -> Vec<RawEntry> {
        (0..count)
            .map(|i| {
                RawEntry::new(format!("cn=user{i},dc=example,dc=com"))
                    .with_attribute("cn", [format!("user{i}")])
            })
            .collect()
    }

    fn session_returning(count: usize) -> MockLdapSession {
        let mut session = MockLdapSession::new();
        session
            .expect_search()
            .times(1)
            .returning(move |_, _, _| Ok(entries(count)));
        session
    }

    #[tokio::test]
    async fn zero_matches_is_not_found() {
        let mut session = session_returning(0);
        let result = search(&mut session, &query()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn one_match_is_returned_unmodified() {
        let mut session = session_returning(1);
        let entry = search(&mut session, &query()).await.unwrap();
        assert_eq!(entry, entries(1).remove(0));
    }

    #[tokio::test]
    async fn several_matches_are_ambiguous() {
        for count in [2, 5] {
            let mut session = session_returning(count);
            let result = search(&mut session, &query()).await;
            assert_eq!(result, Err(Error::Ambiguous { count }));
        }
    }

    #[tokio::test]
    async fn query_is_passed_through() {
        let mut session = MockLdapSession::new();
        session
            .expect_search()
            .withf(|base, scope, filter| {
                base.to_string() == "cn=alice,dc=example,dc=com"
                    && *scope == SearchScope::BaseObject
                    && filter.to_string() == MATCH_ALL_FILTER
            })
            .times(1)
            .returning(|base, _, _| Ok(vec![RawEntry::new(base.to_string())]));

        let query = ResolvedQuery {
            location: "cn=alice,dc=example,dc=com".to_string(),
            scope: SearchScope::BaseObject,
            filter: MATCH_ALL_FILTER.to_string(),
        };
        let entry = search(&mut session, &query).await.unwrap();
        assert_eq!(entry.dn, "cn=alice,dc=example,dc=com");
    }

    #[tokio::test]
    async fn session_errors_propagate_verbatim() {
        let mut session = MockLdapSession::new();
        session.expect_search().times(1).returning(|_, _, _| {
            Err(Error::DirectoryUnavailable(
                "connection closed by peer".to_string(),
            ))
        });

        let result = search(&mut session, &query()).await;
        assert_eq!(
            result,
            Err(Error::DirectoryUnavailable(
                "connection closed by peer".to_string()
            ))
        );
    }
}

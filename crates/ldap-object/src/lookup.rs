//! End-to-end lookup: resolve, search, normalize.

use crate::{
    normalize::{normalize, NormalizedObject},
    query::{resolve, QuerySpecification},
    search::search,
    session::LdapSession,
    Result,
};

/// Resolves `spec` against the session and returns the single matching object.
///
/// One search is issued per call; nothing is retried or cached.
///
/// # Errors
///
/// Propagates every resolution, search and session failure unchanged.
pub async fn lookup(
    session: &mut dyn LdapSession,
    spec: &QuerySpecification,
) -> Result<NormalizedObject> {
    let query = resolve(spec)?;
    let entry = search(session, &query).await?;
    Ok(normalize(&entry))
}

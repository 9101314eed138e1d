//! Scoped views over materialized model handles.

use super::{ModelIdentity, ScopeError, ScopeId, ScopeTree};
use std::collections::BTreeMap;

/// Resolves the model handles visible from `scope`.
///
/// Before materialization (`materialized` is `None`) the view is empty
/// whatever `all` says. With `all` the whole materialization is returned;
/// otherwise only handles for models owned by `scope` or its descendants.
/// The result is always a fresh map.
///
/// # Errors
///
/// Returns [`ScopeError::UnknownScope`] when a scoped lookup names a scope
/// outside `scopes`.
pub fn resolve_view<H: Clone>(
    scopes: &ScopeTree,
    scope: ScopeId,
    all: bool,
    materialized: Option<&BTreeMap<ModelIdentity, H>>,
) -> Result<BTreeMap<ModelIdentity, H>, ScopeError> {
    let Some(handles) = materialized else {
        return Ok(BTreeMap::new());
    };
    if all {
        return Ok(handles.clone());
    }
    let owned = scopes.owned_models(scope, true)?;
    Ok(owned
        .into_iter()
        .filter_map(|identity| {
            let handle = handles.get(&identity)?.clone();
            Some((identity, handle))
        })
        .collect())
}

use thiserror::Error;
use tracing::{debug, trace};
use watchbridge_models::{MediaIds, MediaType};
use watchbridge_remote::RemoteService;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No usable external id and no title+year to search with.
    #[error("media could not be identified: no ids and no title/year")]
    Unresolved,
}

/// Normalize raw external ids into canonical form and enforce the identity
/// invariant: at least one id, or title plus year.
///
/// IMDb ids come in from scrapers with stray slashes and sometimes without
/// the `tt` prefix; both forms are normalized here so index keys compare
/// equal regardless of origin.
pub fn resolve(mut ids: MediaIds) -> Result<MediaIds, IdentityError> {
    if let Some(imdb) = ids.imdb.take() {
        ids.imdb = normalize_imdb(&imdb);
    }

    if ids.is_empty() && !(ids.title.is_some() && ids.year.is_some()) {
        return Err(IdentityError::Unresolved);
    }
    Ok(ids)
}

fn normalize_imdb(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '/').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with("tt") {
        Some(cleaned.to_string())
    } else if cleaned.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("tt{}", cleaned))
    } else {
        None
    }
}

/// Full identification: normalize first, then fall back to a remote
/// title/year search. A search miss still yields a bare title+year identity,
/// usable for best-effort remote matching but never for index lookups.
pub async fn identify(
    remote: &dyn RemoteService,
    media_type: MediaType,
    ids: MediaIds,
    title: Option<&str>,
    year: Option<u32>,
) -> Result<MediaIds, IdentityError> {
    let normalized = resolve(ids).ok();
    if let Some(resolved) = &normalized {
        if !resolved.is_empty() {
            trace!(?resolved, "Identified by external id");
            return Ok(resolved.clone());
        }
    }

    let title = title
        .filter(|t| !t.is_empty())
        .ok_or(IdentityError::Unresolved)?;

    match remote.search(media_type, title, year).await {
        Ok(results) if !results.is_empty() => {
            let mut found = results.into_iter().next().ok_or(IdentityError::Unresolved)?;
            if let Some(resolved) = &normalized {
                found.merge(resolved);
            }
            debug!(title, "Identified via remote search");
            Ok(found.with_metadata(title, year))
        }
        Ok(_) => {
            if year.is_some() {
                debug!(title, "No search hit, using bare title/year identity");
                Ok(MediaIds::new().with_metadata(title, year))
            } else {
                Err(IdentityError::Unresolved)
            }
        }
        Err(e) => {
            debug!(title, error = %e, "Search failed during identification");
            if year.is_some() {
                Ok(MediaIds::new().with_metadata(title, year))
            } else {
                Err(IdentityError::Unresolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imdb_without_prefix_gets_normalized() {
        let mut ids = MediaIds::new();
        ids.imdb = Some("0133093".to_string());
        let resolved = resolve(ids).unwrap();
        assert_eq!(resolved.imdb.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn slashes_are_stripped() {
        let mut ids = MediaIds::new();
        ids.imdb = Some("/tt0133093/".to_string());
        let resolved = resolve(ids).unwrap();
        assert_eq!(resolved.imdb.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn garbage_imdb_is_dropped() {
        let mut ids = MediaIds::new();
        ids.imdb = Some("not-an-id".to_string());
        ids.tmdb = Some(603);
        let resolved = resolve(ids).unwrap();
        assert_eq!(resolved.imdb, None);
        assert_eq!(resolved.tmdb, Some(603));
    }

    #[test]
    fn empty_identity_is_unresolved() {
        assert_eq!(resolve(MediaIds::new()), Err(IdentityError::Unresolved));
    }

    #[test]
    fn title_and_year_alone_satisfy_invariant() {
        let ids = MediaIds::new().with_metadata("The Matrix", Some(1999));
        assert!(resolve(ids).is_ok());
    }

    #[test]
    fn title_without_year_is_unresolved() {
        let mut ids = MediaIds::new();
        ids.title = Some("The Matrix".to_string());
        assert_eq!(resolve(ids), Err(IdentityError::Unresolved));
    }
}

use crate::fallback::FallbackProvider;
use crate::metrics_defs::{FALLBACK_ERRORS, SERVED_FROM_FALLBACK, SERVED_FROM_STORE, STORE_ERRORS};
use crate::store::GroupStore;
use crate::types::Group;
use shared::counter;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResolveError {
    /// The store raised a data error and the fallback had nothing usable.
    #[error("the groups store failed and no fallback was available")]
    StoreFailed,

    /// Neither source could be read, but neither reported a data error
    /// either, e.g. both files are missing.
    #[error("no groups source is available")]
    Unavailable,
}

/// Consults the store first and the fallback document second. The store
/// answer is used only if it has at least one group; an empty or missing
/// store defers to the fallback, whose answer is final even when empty.
pub fn resolve_groups(
    store: &dyn GroupStore,
    fallback: &dyn FallbackProvider,
) -> Result<Vec<Group>, ResolveError> {
    let mut store_failed = false;

    match store.fetch() {
        Ok(Some(groups)) if !groups.is_empty() => {
            counter!(SERVED_FROM_STORE).increment(1);
            return Ok(groups);
        }
        Ok(_) => {}
        Err(_) => {
            counter!(STORE_ERRORS).increment(1);
            store_failed = true;
        }
    }

    match fallback.load() {
        Ok(Some(groups)) => {
            counter!(SERVED_FROM_FALLBACK).increment(1);
            Ok(groups)
        }
        Ok(None) if store_failed => Err(ResolveError::StoreFailed),
        Ok(None) => Err(ResolveError::Unavailable),
        Err(_) => {
            counter!(FALLBACK_ERRORS).increment(1);
            if store_failed {
                Err(ResolveError::StoreFailed)
            } else {
                Err(ResolveError::Unavailable)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fallback::FallbackError;
    use crate::store::StoreError;
    use crate::types::GroupKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub enum StubStore {
        Absent,
        Groups(Vec<Group>),
        Broken,
    }

    impl GroupStore for StubStore {
        fn fetch(&self) -> Result<Option<Vec<Group>>, StoreError> {
            match self {
                StubStore::Absent => Ok(None),
                StubStore::Groups(groups) => Ok(Some(groups.clone())),
                StubStore::Broken => Err(StoreError::MissingNameColumn("groups".into())),
            }
        }
    }

    pub struct StubFallback {
        pub result: Option<Option<Vec<Group>>>,
        pub loads: AtomicUsize,
    }

    impl StubFallback {
        pub fn new(result: Option<Option<Vec<Group>>>) -> Self {
            StubFallback {
                result,
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl FallbackProvider for StubFallback {
        // `None` stands in for an unreadable document
        fn load(&self) -> Result<Option<Vec<Group>>, FallbackError> {
            self.loads.fetch_add(1, Ordering::Relaxed);
            self.result.clone().ok_or_else(|| {
                let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
                FallbackError::Io(e)
            })
        }

        fn store(&self, _groups: &[Group]) -> Result<(), FallbackError> {
            Ok(())
        }
    }

    fn group(id: i64, name: &str) -> Group {
        Group::new(GroupKey::Int(id), name, 1)
    }

    #[test]
    fn test_store_groups_skip_fallback() {
        let store = StubStore::Groups(vec![group(1, "store")]);
        let fallback = StubFallback::new(Some(Some(vec![group(2, "file")])));

        assert_eq!(resolve_groups(&store, &fallback), Ok(vec![group(1, "store")]));
        assert_eq!(fallback.loads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_empty_store_uses_fallback() {
        let store = StubStore::Groups(vec![]);
        let fallback = StubFallback::new(Some(Some(vec![group(1, "a"), group(2, "b")])));

        assert_eq!(
            resolve_groups(&store, &fallback),
            Ok(vec![group(1, "a"), group(2, "b")])
        );
    }

    #[test]
    fn test_absent_store_with_empty_fallback() {
        let fallback = StubFallback::new(Some(Some(vec![])));
        assert_eq!(resolve_groups(&StubStore::Absent, &fallback), Ok(vec![]));
    }

    #[test]
    fn test_store_error_with_fallback_groups() {
        let fallback = StubFallback::new(Some(Some(vec![group(3, "c")])));
        assert_eq!(
            resolve_groups(&StubStore::Broken, &fallback),
            Ok(vec![group(3, "c")])
        );
    }

    #[test]
    fn test_store_error_takes_priority() {
        for result in [Some(None), None] {
            let fallback = StubFallback::new(result);
            assert_eq!(
                resolve_groups(&StubStore::Broken, &fallback),
                Err(ResolveError::StoreFailed)
            );
        }
    }

    #[test]
    fn test_nothing_available() {
        for result in [Some(None), None] {
            let fallback = StubFallback::new(result.clone());
            assert_eq!(
                resolve_groups(&StubStore::Absent, &fallback),
                Err(ResolveError::Unavailable)
            );

            let fallback = StubFallback::new(result);
            assert_eq!(
                resolve_groups(&StubStore::Groups(vec![]), &fallback),
                Err(ResolveError::Unavailable)
            );
        }
    }
}

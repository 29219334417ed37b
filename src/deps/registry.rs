//! Order-preserving registry of resolved dependencies.
//!
//! Resolution happens outside the lock; only the duplicate check and the
//! mutation run under it, so a slow DNS lookup never blocks snapshots taken
//! by the keepalive cycle.

use std::sync::RwLock;

use tracing::info;

use crate::error::{ClaireError, Result};

use super::{resolve_dependency, DependencyKey};

/// Insertion-ordered set of [`DependencyKey`]s.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    entries: RwLock<Vec<DependencyKey>>,
}

impl DependencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `url` and append it.
    ///
    /// Fails with [`ClaireError::DuplicateDependency`] without touching the
    /// registry if the resolved key is already present.
    pub async fn add_dependency(&self, url: &str) -> Result<DependencyKey> {
        let key = resolve_dependency(url).await?;
        self.insert(key.clone())?;
        info!(url = url, dependency = %key, "Dependency added");
        Ok(key)
    }

    /// Resolve `url` and remove the matching entry.
    pub async fn remove_dependency(&self, url: &str) -> Result<()> {
        let key = resolve_dependency(url).await?;
        self.remove(&key)?;
        info!(url = url, dependency = %key, "Dependency removed");
        Ok(())
    }

    /// Resolve every URL in `urls` and replace the registry contents.
    ///
    /// Nothing changes if any URL fails to resolve. Repeated keys in the
    /// input keep their first position.
    pub async fn set_dependencies<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<DependencyKey>> {
        let mut keys: Vec<DependencyKey> = Vec::with_capacity(urls.len());
        for url in urls {
            let key = resolve_dependency(url.as_ref()).await?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        *self.write() = keys.clone();
        info!(count = keys.len(), "Dependencies replaced");
        Ok(keys)
    }

    /// Append an already-resolved key.
    pub fn insert(&self, key: DependencyKey) -> Result<()> {
        let mut entries = self.write();
        if entries.contains(&key) {
            return Err(ClaireError::DuplicateDependency(key));
        }
        entries.push(key);
        Ok(())
    }

    /// Remove an already-resolved key.
    pub fn remove(&self, key: &DependencyKey) -> Result<()> {
        let mut entries = self.write();
        match entries.iter().position(|entry| entry == key) {
            Some(index) => {
                entries.remove(index);
                Ok(())
            }
            None => Err(ClaireError::DependencyNotFound(key.clone())),
        }
    }

    /// Current entries in insertion order.
    pub fn snapshot(&self) -> Vec<DependencyKey> {
        self.read().clone()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.read().contains(key)
    }

    /// Number of registered dependencies.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<DependencyKey>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<DependencyKey>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key(last: u8, port: u16, prefix: &str) -> DependencyKey {
        DependencyKey::new(Ipv4Addr::new(10, 0, 0, last), port, prefix)
    }

    #[test]
    fn test_registry_empty_default() {
        let reg = DependencyRegistry::new();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn test_insert_preserves_order() {
        let reg = DependencyRegistry::new();
        reg.insert(key(3, 80, "/")).unwrap();
        reg.insert(key(1, 80, "/")).unwrap();
        reg.insert(key(2, 80, "/")).unwrap();
        assert_eq!(
            reg.snapshot(),
            vec![key(3, 80, "/"), key(1, 80, "/"), key(2, 80, "/")]
        );
    }

    #[test]
    fn test_insert_duplicate_leaves_registry_unchanged() {
        let reg = DependencyRegistry::new();
        reg.insert(key(1, 80, "/")).unwrap();
        reg.insert(key(2, 80, "/")).unwrap();
        let before = reg.snapshot();

        let err = reg.insert(key(1, 80, "/")).unwrap_err();
        assert!(matches!(err, ClaireError::DuplicateDependency(k) if k == key(1, 80, "/")));
        assert_eq!(reg.snapshot(), before);
    }

    #[test]
    fn test_same_ip_different_prefix_is_distinct() {
        let reg = DependencyRegistry::new();
        reg.insert(key(1, 80, "/a")).unwrap();
        reg.insert(key(1, 80, "/b")).unwrap();
        reg.insert(key(1, 81, "/a")).unwrap();
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let reg = DependencyRegistry::new();
        for i in 1..=4 {
            reg.insert(key(i, 80, "/")).unwrap();
        }
        reg.remove(&key(2, 80, "/")).unwrap();
        assert_eq!(
            reg.snapshot(),
            vec![key(1, 80, "/"), key(3, 80, "/"), key(4, 80, "/")]
        );
    }

    #[test]
    fn test_remove_absent_leaves_registry_unchanged() {
        let reg = DependencyRegistry::new();
        reg.insert(key(1, 80, "/")).unwrap();
        let err = reg.remove(&key(9, 80, "/")).unwrap_err();
        assert!(matches!(err, ClaireError::DependencyNotFound(_)));
        assert_eq!(reg.snapshot(), vec![key(1, 80, "/")]);
    }

    #[tokio::test]
    async fn test_add_dependency_twice_is_rejected() {
        let reg = DependencyRegistry::new();
        let added = reg.add_dependency("http://127.0.0.1:8283").await.unwrap();
        assert_eq!(added, DependencyKey::new(Ipv4Addr::LOCALHOST, 8283, "/"));

        let err = reg
            .add_dependency("http://127.0.0.1:8283/")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaireError::DuplicateDependency(_)));
        assert_eq!(reg.snapshot(), vec![added]);
    }

    #[tokio::test]
    async fn test_add_invalid_url_does_not_mutate() {
        let reg = DependencyRegistry::new();
        let err = reg.add_dependency("http://127.0.0.1/").await.unwrap_err();
        assert!(matches!(err, ClaireError::InvalidDependencyUrl(_)));
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn test_remove_dependency_by_url() {
        let reg = DependencyRegistry::new();
        reg.add_dependency("http://127.0.0.1:8283/a").await.unwrap();
        reg.add_dependency("http://127.0.0.1:8283/b").await.unwrap();

        reg.remove_dependency("http://127.0.0.1:8283/a").await.unwrap();
        assert_eq!(
            reg.snapshot(),
            vec![DependencyKey::new(Ipv4Addr::LOCALHOST, 8283, "/b")]
        );

        let err = reg
            .remove_dependency("http://127.0.0.1:8283/a")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaireError::DependencyNotFound(_)));
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn test_set_dependencies_replaces_and_dedups() {
        let reg = DependencyRegistry::new();
        reg.insert(key(1, 80, "/")).unwrap();

        let keys = reg
            .set_dependencies(&[
                "http://127.0.0.1:9001/",
                "http://127.0.0.1:9000/",
                "http://127.0.0.1:9001",
            ])
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(reg.snapshot(), keys);
        assert_eq!(reg.snapshot()[0].port, 9001);
    }

    #[tokio::test]
    async fn test_set_dependencies_failure_keeps_previous() {
        let reg = DependencyRegistry::new();
        reg.insert(key(1, 80, "/")).unwrap();

        let result = reg
            .set_dependencies(&["http://127.0.0.1:9000/", "https://bad:1/"])
            .await;
        assert!(result.is_err());
        assert_eq!(reg.snapshot(), vec![key(1, 80, "/")]);
    }
}

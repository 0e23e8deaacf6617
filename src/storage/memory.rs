//! In-memory object store.
//!
//! Holds objects in a sorted map and counts every call, which makes it
//! useful both for seeding a local development instance and for asserting
//! how often the real store would have been hit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStore, split_path};
use crate::types::FileStat;
use crate::{HuginnError, Result};

#[derive(Default)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
    reads: AtomicUsize,
    lists: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) an object at `/<bucket>/<object>`.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), data.into());
    }

    /// Number of `read` calls served so far (hits and misses).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `list` calls served so far.
    pub fn list_count(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        split_path(path, false)?;
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| HuginnError::NotFound(path.to_string()))
    }

    async fn list(&self, dir: &str) -> Result<Vec<FileStat>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        split_path(dir, true)?;
        let dir = if dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{dir}/")
        };

        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<FileStat> = Vec::new();
        for (path, data) in objects
            .range(dir.clone()..)
            .take_while(|(path, _)| path.starts_with(&dir))
        {
            let rest = &path[dir.len()..];
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_dir = format!("{dir}{child}/");
                    // Keys are sorted, so siblings under one child are adjacent.
                    if entries.last().is_none_or(|e| e.filename != child_dir) {
                        entries.push(FileStat::dir(child_dir));
                    }
                }
                None if !rest.is_empty() => {
                    entries.push(FileStat::file(path.clone(), data.len() as u64));
                }
                None => {}
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert("/b/logs/job/1/started.json", "{}");
        store.insert("/b/logs/job/1/artifacts/junit_01.xml", "<testsuite/>");
        store.insert("/b/logs/job/2/started.json", "{}");
        store.insert("/b/logs/job/latest-build.txt", "2");
        store.insert("/b/logs/jobber/1/started.json", "{}");
        store
    }

    #[tokio::test]
    async fn read_existing_and_missing() {
        let store = seeded();
        assert_eq!(
            store.read("/b/logs/job/latest-build.txt").await.unwrap(),
            Bytes::from_static(b"2")
        );
        let err = store.read("/b/logs/job/3/started.json").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn list_is_one_level_deep() {
        let store = seeded();
        let entries = store.list("/b/logs/job/").await.unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|e| (e.filename.as_str(), e.is_dir))
            .collect();
        assert_eq!(
            names,
            vec![
                ("/b/logs/job/1/", true),
                ("/b/logs/job/2/", true),
                ("/b/logs/job/latest-build.txt", false),
            ]
        );
    }

    #[tokio::test]
    async fn list_without_trailing_slash_does_not_match_siblings() {
        let store = seeded();
        let entries = store.list("/b/logs/job").await.unwrap();
        assert!(entries.iter().all(|e| !e.filename.starts_with("/b/logs/jobber")));
        assert_eq!(store.list_count(), 1);
    }
}

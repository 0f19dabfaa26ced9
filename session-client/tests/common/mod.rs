//! Shared harness for session-client integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use client_core::storage::{KeyValueStore, MemoryStore};
use session_client::config::ApiSettings;
use session_client::models::{CategoryRef, Club, RoleAssignment, UserProfile};
use session_client::{LoginSession, MockObserver, SessionStore};

pub struct TestHarness {
    pub store: Arc<SessionStore>,
    pub storage: Arc<MemoryStore>,
    pub observer: Arc<MockObserver>,
}

pub fn harness(base_url: &str) -> TestHarness {
    let storage = Arc::new(MemoryStore::new());
    let observer = Arc::new(MockObserver::new());
    let store = build_store(base_url, storage.clone(), observer.clone());
    TestHarness {
        store,
        storage,
        observer,
    }
}

pub fn build_store(
    base_url: &str,
    storage: Arc<dyn KeyValueStore>,
    observer: Arc<MockObserver>,
) -> Arc<SessionStore> {
    let api = ApiSettings {
        base_url: base_url.trim_end_matches('/').to_string(),
        timeout_seconds: 5,
    };
    Arc::new(SessionStore::new(api, storage, observer).expect("session store"))
}

/// Storage whose writes can be made to fail mid-test, immediately or after
/// a set number of successful writes. Reads and removals keep working so
/// logout still clears state.
pub struct FailingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_after: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            writes: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_after.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    pub fn fail_writes_after(&self, successful: usize) {
        self.fail_after.store(successful, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let done = self.writes.fetch_add(1, Ordering::SeqCst);
        if done >= self.fail_after.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("disk full"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        self.inner.remove(key).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), anyhow::Error> {
        self.inner.remove_many(keys).await
    }
}

pub fn role(name: &str, category_id: i64, category: &str) -> RoleAssignment {
    RoleAssignment {
        role: name.to_string(),
        category: CategoryRef {
            id: category_id,
            name: category.to_string(),
        },
    }
}

pub fn club() -> Club {
    Club {
        id: 7,
        name: "SC Example".to_string(),
        vote_lock_days: 2,
        training_lock_hours: 6,
    }
}

pub fn profile(preferred_role: Option<&str>) -> UserProfile {
    UserProfile {
        id: 42,
        first_name: "Alex".to_string(),
        last_name: "Keeper".to_string(),
        email: Some("alex@example.com".to_string()),
        preferred_role: preferred_role.map(str::to_string),
        ..UserProfile::default()
    }
}

pub fn login_session(roles: Vec<RoleAssignment>, preferred_role: Option<&str>) -> LoginSession {
    let categories = roles.iter().map(|r| r.category.name.clone()).collect();
    LoginSession {
        access_token: "tok1".to_string(),
        refresh_token: "ref1".to_string(),
        club: Some(club()),
        roles,
        categories,
        profile: profile(preferred_role),
        device_token: None,
    }
}

pub async fn calls_to(server: &wiremock::MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == wanted)
        .count()
}

/// JSON body of a `GET /me/` response.
pub fn me_body(
    profile: &UserProfile,
    roles: &[RoleAssignment],
    categories: &[String],
    club: Option<&Club>,
) -> serde_json::Value {
    serde_json::json!({
        "user": profile,
        "roles": roles,
        "categories": categories,
        "club": club,
    })
}

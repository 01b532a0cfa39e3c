//! Shared builders for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tgvault::linking::{CodeGenerator, LinkRegistry, LinkResolver};
use tgvault::storage::CredentialStore;
use tgvault::web::AppState;

use crate::mocks::{MockMessenger, MockSessions, MockStore};

pub const BOT_TOKEN: &str = "123456:ABC-token";
pub const BOT_USERNAME: &str = "tgvault_bot";
pub const FRONTEND_URL: &str = "https://app.example.com/";
pub const TEST_TTL: Duration = Duration::from_secs(600);
pub const TEST_PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Generator that hands out `codes` in order, then repeats the last one
pub fn fixed_codes(codes: &[&str]) -> CodeGenerator {
    let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    let next = std::sync::atomic::AtomicUsize::new(0);
    Box::new(move || {
        let i = next.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        codes[i.min(codes.len() - 1)].clone()
    })
}

pub fn registry_with(store: Arc<MockStore>, generate: CodeGenerator) -> Arc<LinkRegistry> {
    let store: Arc<dyn CredentialStore> = store;
    Arc::new(LinkRegistry::with_settings(
        store,
        BOT_USERNAME,
        TEST_TTL,
        TEST_PERSIST_TIMEOUT,
        generate,
    ))
}

/// Everything an HTTP test needs to poke at after a request
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MockStore>,
    pub messenger: Arc<MockMessenger>,
    pub registry: Arc<LinkRegistry>,
}

/// State with `alice-token -> user-alice` and `bob-token -> user-bob`
pub fn test_app(store: MockStore) -> TestApp {
    let store = Arc::new(store);
    let messenger = Arc::new(MockMessenger::new());
    let registry = registry_with(Arc::clone(&store), fixed_codes(&["A3B9C4", "77E0F1"]));
    let sessions = MockSessions::new()
        .with_token("alice-token", "user-alice")
        .with_token("bob-token", "user-bob");

    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let state = AppState {
        store: Arc::clone(&dyn_store),
        registry: Arc::clone(&registry),
        resolver: LinkResolver::new(dyn_store),
        messenger: messenger.clone(),
        sessions: Arc::new(sessions),
        bot_secret: BOT_TOKEN.to_string(),
        frontend_url: FRONTEND_URL.to_string(),
        max_upload_bytes: 1024,
    };

    TestApp {
        state,
        store,
        messenger,
        registry,
    }
}

//! Unit tests for the signing session stores
//!
//! Both backends must implement the same single-slot semantics: checkpoint
//! overwrites, resume is a side-effect-free read, clear is idempotent.

use chainsig_core::{
    DerivationPath, Error, FileSessionStore, MemorySessionStore, SessionStore, SigningSession,
};
use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "chainsig-session-test-{}-{}",
        tag,
        rand::random::<u64>()
    ))
}

fn session(path: &str, tag: u8) -> SigningSession {
    SigningSession::new(
        DerivationPath::new(path).unwrap(),
        vec![0x02, 0xc0 | tag, tag],
    )
}

// ============================================================================
// Shared Semantics
// ============================================================================

async fn check_lifecycle(store: &dyn SessionStore) {
    assert_eq!(store.resume().await.unwrap(), None);

    let first = session("evm-1", 1);
    store.checkpoint(&first).await.unwrap();

    // Resume is idempotent: repeated reads return the same record.
    assert_eq!(store.resume().await.unwrap(), Some(first.clone()));
    assert_eq!(store.resume().await.unwrap(), Some(first.clone()));

    // A second checkpoint replaces the first unconditionally.
    let second = session("evm-2", 2);
    store.checkpoint(&second).await.unwrap();
    assert_eq!(store.resume().await.unwrap(), Some(second));

    store.clear().await.unwrap();
    assert_eq!(store.resume().await.unwrap(), None);

    // Clearing an empty store is not an error.
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_memory_store_lifecycle() {
    check_lifecycle(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn test_file_store_lifecycle() {
    let dir = temp_dir("lifecycle");
    check_lifecycle(&FileSessionStore::new(&dir, "alice.example")).await;
    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// File Store Durability
// ============================================================================

#[tokio::test]
async fn test_file_store_survives_process_restart() {
    let dir = temp_dir("restart");
    let record = session("evm-1", 7);

    // First "process" checkpoints and goes away.
    {
        let store = FileSessionStore::new(&dir, "alice.example");
        store.checkpoint(&record).await.unwrap();
    }

    // A later one over the same directory and scope resumes the record.
    let store = FileSessionStore::new(&dir, "alice.example");
    assert_eq!(store.resume().await.unwrap(), Some(record));
    store.clear().await.unwrap();
    assert_eq!(store.resume().await.unwrap(), None);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_file_store_scopes_do_not_share_a_slot() {
    let dir = temp_dir("scopes");
    let alice = FileSessionStore::new(&dir, "alice.example");
    let bob = FileSessionStore::new(&dir, "bob.example");

    alice.checkpoint(&session("evm-1", 1)).await.unwrap();
    assert_eq!(bob.resume().await.unwrap(), None);

    bob.checkpoint(&session("evm-2", 2)).await.unwrap();
    assert_eq!(alice.resume().await.unwrap(), Some(session("evm-1", 1)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_checkpoint() {
    let dir = temp_dir("corrupt");
    let store = FileSessionStore::new(&dir, "alice.example");
    store.checkpoint(&session("evm-1", 1)).await.unwrap();

    // Overwrite the slot with bytes that never came from a checkpoint.
    let slot = std::fs::read_dir(&dir).unwrap().next().unwrap().unwrap();
    std::fs::write(slot.path(), b"{\"path\":").unwrap();

    match store.resume().await {
        Err(Error::Deserialization(_)) => {}
        other => panic!("Expected Deserialization, got {:?}", other),
    }

    // The caller can still clear the bad slot and start over.
    store.clear().await.unwrap();
    assert_eq!(store.resume().await.unwrap(), None);

    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// Serialization Shape
// ============================================================================

#[test]
fn test_session_record_wire_shape() {
    let record = session("evm-1", 3);
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["path"], "evm-1");
    assert!(value["transaction"].is_array());

    let back: SigningSession = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_session_record_rejects_empty_path() {
    let bad = serde_json::json!({ "path": "", "transaction": [2, 192] });
    assert!(serde_json::from_value::<SigningSession>(bad).is_err());
}

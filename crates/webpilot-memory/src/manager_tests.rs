use super::*;
use serde_json::json;
use tempfile::TempDir;

fn manager() -> (TempDir, MemoryManager) {
    let dir = TempDir::new().unwrap();
    let manager = MemoryManager::new(dir.path()).unwrap();
    (dir, manager)
}

#[test]
fn test_sanitize_id() {
    assert_eq!(sanitize_id("alice-01").unwrap(), "alice-01");
    assert_eq!(sanitize_id("alice_smith").unwrap(), "alice_5fsmith");
    assert_eq!(sanitize_id("alice.smith").unwrap(), "alice_2esmith");
    assert_eq!(sanitize_id("../etc").unwrap(), "_2e_2e_2fetc");
    assert_eq!(sanitize_id("é").unwrap(), "_c3_a9");
    assert!(sanitize_id("  ").is_err());
}

#[test]
fn test_similar_ids_keep_separate_files() {
    let dir = TempDir::new().unwrap();
    {
        let manager = MemoryManager::new(dir.path()).unwrap();
        for (id, value) in [("alice.smith", "dot"), ("alice_smith", "underscore")] {
            manager.create_memory(id, Map::new()).unwrap();
            manager.update_memory(id, "k", json!(value)).unwrap();
            manager
                .add_message_to_conversation(id, ChatMessage::new("user", value))
                .unwrap();
        }
        assert!(manager.delete_memory("alice_smith").unwrap());
        assert!(manager.delete_conversation("alice_smith").unwrap());
    }

    let reopened = MemoryManager::new(dir.path()).unwrap();
    let memory = reopened.get_memory("alice.smith").unwrap();
    assert_eq!(memory.get("k"), Some(&json!("dot")));
    assert!(reopened.get_memory("alice_smith").is_none());
    let conv = reopened.get_conversation("alice.smith").unwrap();
    assert_eq!(conv.messages[0].content, "dot");
    assert!(reopened.get_conversation("alice_smith").is_none());
}

#[test]
fn test_new_creates_layout() {
    let (dir, _manager) = manager();
    assert!(dir.path().join("memories").is_dir());
    assert!(dir.path().join("conversations").is_dir());
}

#[test]
fn test_memory_lifecycle() {
    let (dir, manager) = manager();
    assert!(manager.get_memory("alice").is_none());
    assert!(manager.update_memory("alice", "k", json!(1)).unwrap().is_none());

    manager.create_memory("alice", Map::new()).unwrap();
    let updated = manager
        .update_memory("alice", "city", json!("Paris"))
        .unwrap()
        .unwrap();
    assert_eq!(updated.get("city"), Some(&json!("Paris")));

    let file = dir.path().join("memories/alice.json");
    let on_disk: Memory = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(on_disk.data["city"], json!("Paris"));

    assert_eq!(
        manager.remove_memory_key("alice", "city").unwrap(),
        Some(json!("Paris"))
    );
    assert!(manager.delete_memory("alice").unwrap());
    assert!(!file.exists());
    assert!(!manager.delete_memory("alice").unwrap());
}

#[test]
fn test_set_memory_data_replaces_keys() {
    let (_dir, manager) = manager();
    let mut initial = Map::new();
    initial.insert("a".to_string(), json!(1));
    manager.create_memory("bob", initial).unwrap();

    let mut data = Map::new();
    data.insert("b".to_string(), json!(2));
    let memory = manager.set_memory_data("bob", data).unwrap();
    assert!(memory.get("a").is_none());
    assert_eq!(memory.get("b"), Some(&json!(2)));

    let fresh = manager.set_memory_data("carol", Map::new()).unwrap();
    assert_eq!(fresh.memory_id, "carol");
}

#[test]
fn test_get_or_create_memory() {
    let (_dir, manager) = manager();
    let memory = manager.get_or_create_memory("dave").unwrap();
    assert!(memory.data.is_empty());
    assert_eq!(manager.all_memories().len(), 1);
}

#[test]
fn test_conversation_autocreate_and_clear() {
    let (dir, manager) = manager();
    manager
        .add_message_to_conversation("alice", ChatMessage::new("user", "hi"))
        .unwrap();
    let conv = manager
        .add_message_to_conversation("alice", ChatMessage::new("assistant", "hello"))
        .unwrap();
    assert_eq!(conv.len(), 2);
    assert!(dir.path().join("conversations/alice.json").exists());

    assert!(manager.clear_conversation("alice").unwrap());
    assert!(manager.get_conversation("alice").unwrap().is_empty());
    assert!(!manager.clear_conversation("nobody").unwrap());

    assert!(manager.delete_conversation("alice").unwrap());
    assert!(manager.get_conversation("alice").is_none());
}

#[test]
fn test_reload_from_disk() {
    let dir = TempDir::new().unwrap();
    {
        let manager = MemoryManager::new(dir.path()).unwrap();
        let mut data = Map::new();
        data.insert("lang".to_string(), json!("en"));
        manager.create_memory("user/1", data).unwrap();
        manager
            .add_message_to_conversation("user/1", ChatMessage::new("user", "open github"))
            .unwrap();
    }
    assert!(dir.path().join("memories/user_2f1.json").exists());

    let reopened = MemoryManager::new(dir.path()).unwrap();
    let memory = reopened.get_memory("user/1").unwrap();
    assert_eq!(memory.get("lang"), Some(&json!("en")));
    let conv = reopened.get_conversation("user/1").unwrap();
    assert_eq!(conv.messages[0].content, "open github");
    assert_eq!(reopened.all_conversations().len(), 1);
}

#[test]
fn test_unreadable_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("memories")).unwrap();
    std::fs::write(dir.path().join("memories/broken.json"), "{not json").unwrap();
    std::fs::write(dir.path().join("memories/notes.txt"), "ignored").unwrap();

    let manager = MemoryManager::new(dir.path()).unwrap();
    assert!(manager.all_memories().is_empty());
}

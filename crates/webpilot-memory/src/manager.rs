//! The memory manager.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::MemoryError;
use crate::memory::{ChatMessage, ConversationMemory, Memory};

const MEMORIES_DIR: &str = "memories";
const CONVERSATIONS_DIR: &str = "conversations";

/// File-safe form of an id. `[A-Za-z0-9-]` is kept as is; every other
/// byte, `_` included, becomes `_` plus two lowercase hex digits, so
/// distinct ids never share a file.
pub fn sanitize_id(id: &str) -> Result<String, MemoryError> {
    if id.trim().is_empty() {
        return Err(MemoryError::InvalidId(id.to_string()));
    }
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    Ok(out)
}

/// Stores user memories and conversations, persisted as JSON files.
///
/// Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct MemoryManager {
    data_dir: PathBuf,
    memories: RwLock<HashMap<String, Memory>>,
    conversations: RwLock<HashMap<String, ConversationMemory>>,
}

impl MemoryManager {
    /// Open the store at `data_dir`, creating it if needed and loading
    /// every readable file.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        for sub in [MEMORIES_DIR, CONVERSATIONS_DIR] {
            let dir = data_dir.join(sub);
            std::fs::create_dir_all(&dir).map_err(|e| MemoryError::CreateDirFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        }

        let memories: HashMap<String, Memory> = load_dir(&data_dir.join(MEMORIES_DIR))
            .into_iter()
            .map(|m: Memory| (m.memory_id.clone(), m))
            .collect();
        let conversations: HashMap<String, ConversationMemory> =
            load_dir(&data_dir.join(CONVERSATIONS_DIR))
                .into_iter()
                .map(|c: ConversationMemory| (c.memory_id.clone(), c))
                .collect();

        info!(
            "Loaded {} memories and {} conversations from {}",
            memories.len(),
            conversations.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir,
            memories: RwLock::new(memories),
            conversations: RwLock::new(conversations),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_for(&self, sub: &str, id: &str) -> Result<PathBuf, MemoryError> {
        Ok(self
            .data_dir
            .join(sub)
            .join(format!("{}.json", sanitize_id(id)?)))
    }

    fn write<T: Serialize>(&self, sub: &str, id: &str, value: &T) -> Result<(), MemoryError> {
        let path = self.file_for(sub, id)?;
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    fn remove(&self, sub: &str, id: &str) -> Result<(), MemoryError> {
        let path = self.file_for(sub, id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // --- key/value memories ---

    pub fn get_memory(&self, id: &str) -> Option<Memory> {
        self.memories.read().get(id).cloned()
    }

    /// Create (or replace) the memory for `id`.
    pub fn create_memory(&self, id: &str, data: Map<String, Value>) -> Result<Memory, MemoryError> {
        let memory = Memory::with_data(id, data);
        let mut memories = self.memories.write();
        self.write(MEMORIES_DIR, id, &memory)?;
        memories.insert(id.to_string(), memory.clone());
        Ok(memory)
    }

    /// The memory for `id`, created empty if missing.
    pub fn get_or_create_memory(&self, id: &str) -> Result<Memory, MemoryError> {
        match self.get_memory(id) {
            Some(memory) => Ok(memory),
            None => self.create_memory(id, Map::new()),
        }
    }

    /// Set one key. Returns `None` when there is no memory for `id`.
    pub fn update_memory(
        &self,
        id: &str,
        key: &str,
        value: Value,
    ) -> Result<Option<Memory>, MemoryError> {
        let mut memories = self.memories.write();
        let Some(memory) = memories.get_mut(id) else {
            return Ok(None);
        };
        memory.set(key, value);
        self.write(MEMORIES_DIR, id, memory)?;
        Ok(Some(memory.clone()))
    }

    /// Remove one key. Returns the removed value.
    pub fn remove_memory_key(&self, id: &str, key: &str) -> Result<Option<Value>, MemoryError> {
        let mut memories = self.memories.write();
        let Some(memory) = memories.get_mut(id) else {
            return Ok(None);
        };
        let old = memory.delete(key);
        if old.is_some() {
            self.write(MEMORIES_DIR, id, memory)?;
        }
        Ok(old)
    }

    /// Replace every key of the memory for `id`, creating it if missing.
    pub fn set_memory_data(&self, id: &str, data: Map<String, Value>) -> Result<Memory, MemoryError> {
        let mut memories = self.memories.write();
        let memory = memories
            .entry(id.to_string())
            .or_insert_with(|| Memory::new(id));
        memory.clear();
        memory.data = data;
        self.write(MEMORIES_DIR, id, memory)?;
        Ok(memory.clone())
    }

    /// Delete the memory and its file. Returns whether it existed.
    pub fn delete_memory(&self, id: &str) -> Result<bool, MemoryError> {
        let mut memories = self.memories.write();
        if memories.remove(id).is_none() {
            return Ok(false);
        }
        if let Err(e) = self.remove(MEMORIES_DIR, id) {
            warn!("Failed to delete memory file for {}: {}", id, e);
        }
        Ok(true)
    }

    pub fn all_memories(&self) -> Vec<Memory> {
        self.memories.read().values().cloned().collect()
    }

    // --- conversations ---

    pub fn get_conversation(&self, id: &str) -> Option<ConversationMemory> {
        self.conversations.read().get(id).cloned()
    }

    pub fn create_conversation(&self, id: &str) -> Result<ConversationMemory, MemoryError> {
        let conversation = ConversationMemory::new(id);
        let mut conversations = self.conversations.write();
        self.write(CONVERSATIONS_DIR, id, &conversation)?;
        conversations.insert(id.to_string(), conversation.clone());
        Ok(conversation)
    }

    /// Append a message, creating the conversation if needed.
    pub fn add_message_to_conversation(
        &self,
        id: &str,
        message: ChatMessage,
    ) -> Result<ConversationMemory, MemoryError> {
        let mut conversations = self.conversations.write();
        let conversation = conversations
            .entry(id.to_string())
            .or_insert_with(|| ConversationMemory::new(id));
        conversation.add_message(message);
        self.write(CONVERSATIONS_DIR, id, conversation)?;
        Ok(conversation.clone())
    }

    /// Empty the conversation. Returns whether it existed.
    pub fn clear_conversation(&self, id: &str) -> Result<bool, MemoryError> {
        let mut conversations = self.conversations.write();
        let Some(conversation) = conversations.get_mut(id) else {
            return Ok(false);
        };
        conversation.clear();
        self.write(CONVERSATIONS_DIR, id, conversation)?;
        Ok(true)
    }

    pub fn delete_conversation(&self, id: &str) -> Result<bool, MemoryError> {
        let mut conversations = self.conversations.write();
        if conversations.remove(id).is_none() {
            return Ok(false);
        }
        if let Err(e) = self.remove(CONVERSATIONS_DIR, id) {
            warn!("Failed to delete conversation file for {}: {}", id, e);
        }
        Ok(true)
    }

    pub fn all_conversations(&self) -> Vec<ConversationMemory> {
        self.conversations.read().values().cloned().collect()
    }
}

fn load_dir<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            let parsed = std::fs::read_to_string(&path)
                .map_err(MemoryError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(MemoryError::from));
            match parsed {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping unreadable {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

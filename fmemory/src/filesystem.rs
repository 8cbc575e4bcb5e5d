//! File-backed conversation dialogs and states, one JSON document per conversation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fcommon::{BoxFuture, ConversationId};
use fprovider::Message;
use serde::{Deserialize, Serialize};

use crate::{ConversationStateStore, ConversationStates, ConversationStore, MemoryError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedConversation {
    #[serde(default)]
    dialogs: Vec<Message>,
    #[serde(default)]
    states: ConversationStates,
}

#[derive(Debug)]
pub struct FilesystemConversationStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemConversationStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("conversations")).map_err(|error| {
            MemoryError::storage(format!("failed to create conversation store root: {error}"))
        })?;

        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn conversation_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.root.join("conversations").join(format!(
            "{}.json",
            hex_encode(conversation_id.as_str().as_bytes())
        ))
    }

    fn load(&self, conversation_id: &ConversationId) -> Result<PersistedConversation, MemoryError> {
        let path = self.conversation_path(conversation_id);
        if !path.exists() {
            return Ok(PersistedConversation::default());
        }

        let bytes = fs::read(&path).map_err(|error| {
            MemoryError::storage(format!("failed to read conversation file: {error}"))
        })?;
        serde_json::from_slice(&bytes).map_err(|error| {
            MemoryError::storage(format!("failed to deserialize conversation: {error}"))
        })
    }

    fn save(
        &self,
        conversation_id: &ConversationId,
        conversation: &PersistedConversation,
    ) -> Result<(), MemoryError> {
        let bytes = serde_json::to_vec_pretty(conversation).map_err(|error| {
            MemoryError::storage(format!("failed to serialize conversation: {error}"))
        })?;

        write_atomic(&self.conversation_path(conversation_id), &bytes)
    }

    fn update<F>(&self, conversation_id: &ConversationId, apply: F) -> Result<(), MemoryError>
    where
        F: FnOnce(&mut PersistedConversation),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem store lock poisoned"))?;
        let mut conversation = self.load(conversation_id)?;
        apply(&mut conversation);
        self.save(conversation_id, &conversation)
    }

    fn read(&self, conversation_id: &ConversationId) -> Result<PersistedConversation, MemoryError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem store lock poisoned"))?;
        self.load(conversation_id)
    }
}

impl ConversationStore for FilesystemConversationStore {
    fn load_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move { Ok(self.read(conversation_id)?.dialogs) })
    }

    fn append_dialogs<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        dialogs: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.update(conversation_id, |conversation| {
                conversation.dialogs.extend(dialogs)
            })
        })
    }
}

impl ConversationStateStore for FilesystemConversationStore {
    fn load_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<ConversationStates, MemoryError>> {
        Box::pin(async move { Ok(self.read(conversation_id)?.states) })
    }

    fn set_states<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        entries: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.update(conversation_id, |conversation| {
                conversation.states.extend(entries)
            })
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage(
            "conversation file missing parent directory",
        ));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary conversation file: {error}"))
    })?;

    if path.exists() {
        fs::remove_file(path).map_err(|error| {
            MemoryError::storage(format!("failed to replace conversation file: {error}"))
        })?;
    }
    fs::rename(&tmp, path).map_err(|error| {
        MemoryError::storage(format!("failed to finalize conversation file: {error}"))
    })
}

fn hex_encode(input: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(DIGITS[usize::from(byte >> 4)] as char);
        output.push(DIGITS[usize::from(byte & 0x0f)] as char);
    }
    output
}

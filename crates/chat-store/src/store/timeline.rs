//! Ordered message sequence of one channel

use chat_core::{Message, Snowflake};

/// Messages of a channel sorted by `(created_at, id)`
///
/// Appends in arrival order are the common case and stay O(1); merged
/// history pages are placed by binary search.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    messages: Vec<Message>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn position(&self, id: Snowflake) -> Option<usize> {
        self.messages.iter().rposition(|m| m.id == id)
    }

    pub fn get(&self, id: Snowflake) -> Option<&Message> {
        self.position(id).map(|i| &self.messages[i])
    }

    pub fn get_mut(&mut self, id: Snowflake) -> Option<&mut Message> {
        self.position(id).map(move |i| &mut self.messages[i])
    }

    /// Insert keeping the sort order
    pub fn insert(&mut self, message: Message) {
        let key = (message.created_at, message.id);
        let at = self
            .messages
            .partition_point(|m| (m.created_at, m.id) <= key);
        self.messages.insert(at, message);
    }

    pub fn remove(&mut self, id: Snowflake) -> Option<Message> {
        self.position(id).map(|i| self.messages.remove(i))
    }

    /// Replace the message stored under `id`, re-sorting if its key moved
    pub fn replace(&mut self, id: Snowflake, message: Message) -> bool {
        match self.remove(id) {
            Some(_) => {
                self.insert(message);
                true
            }
            None => false,
        }
    }

    /// Pending message carrying `nonce`
    pub fn find_by_nonce(&self, nonce: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.nonce() == Some(nonce))
    }

    /// Oldest pending message by `author_id` with exactly this body
    pub fn find_pending_like(&self, author_id: Snowflake, content: &str) -> Option<&Message> {
        // provisional ids count down, so the oldest has the largest id
        self.messages
            .iter()
            .filter(|m| m.is_pending() && m.author_id == author_id && m.content == content)
            .max_by_key(|m| m.id)
    }

    /// Oldest server-issued message, the cursor for scroll-back
    pub fn oldest_confirmed(&self) -> Option<&Message> {
        self.messages.iter().find(|m| !m.is_pending())
    }

    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_pending())
    }

    pub fn ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.messages.iter().map(|m| m.id)
    }
}

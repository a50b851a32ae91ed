use std::collections::VecDeque;

/// FIFO-ordered set of users currently searching for a partner.
///
/// Arrival order is the matching policy: the earliest-waiting compatible
/// candidate always wins. Membership is unique; pushing an id that is already
/// queued is a no-op.
#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<String>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Enqueue a user at the back. Returns false if the id was already queued.
    pub fn push(&mut self, user_id: &str) -> bool {
        if self.contains(user_id) {
            return false;
        }
        self.queue.push_back(user_id.to_string());
        true
    }

    /// Remove a user wherever it sits in the queue. Returns whether a removal
    /// happened.
    pub fn remove(&mut self, user_id: &str) -> bool {
        if let Some(pos) = self.queue.iter().position(|id| id.as_str() == user_id) {
            self.queue.remove(pos);
            true
        } else {
            false
        }
    }

    /// First queued id (in arrival order) that is not `exclude` and satisfies
    /// the predicate. Does not remove the entry.
    pub fn first_match<F>(&self, exclude: &str, mut accept: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        self.queue
            .iter()
            .find(|id| id.as_str() != exclude && accept(id))
            .cloned()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.queue.iter().any(|id| id.as_str() == user_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|id| id.as_str())
    }
}

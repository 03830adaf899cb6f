//! The client's own view of which channels it belongs to.

use std::collections::HashMap;

use arcchat_session::Channel;

/// Channel name → channel handle.
///
/// Filled only from join and leave confirmations, never from the commands
/// that request them. A name appears at most once.
#[derive(Debug, Default)]
pub struct ChannelMap {
    channels: HashMap<String, Channel>,
}

impl ChannelMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records membership of `channel`.
    ///
    /// Returns `false`, leaving the existing entry alone, if the name is
    /// already present.
    pub fn join(&mut self, channel: &Channel) -> bool {
        if self.channels.contains_key(channel.name()) {
            return false;
        }
        self.channels
            .insert(channel.name().to_string(), channel.clone());
        true
    }

    /// Forgets `name`, returning its handle if it was a member.
    pub fn leave(&mut self, name: &str) -> Option<Channel> {
        self.channels.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Member channel names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

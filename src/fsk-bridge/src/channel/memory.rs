//! In-process virtual filesystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{Channel, ChannelError};

/// In-memory channel, the Rust stand-in for the runtime's MEMFS.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    files: Mutex<HashMap<String, String>>,
    /// Every successful write, in order.
    writes: Mutex<Vec<(String, String)>>,
    fail_writes: AtomicBool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Contents successfully written to `name`, oldest first.
    pub fn writes_to(&self, name: &str) -> Vec<String> {
        self.writes
            .lock()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// Names currently present.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Channel for MemoryChannel {
    fn write(&self, name: &str, content: &str) -> Result<(), ChannelError> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(ChannelError::WriteRejected {
                name: name.to_string(),
                reason: "write failure injected".to_string(),
            });
        }
        self.files
            .lock()
            .insert(name.to_string(), content.to_string());
        self.writes
            .lock()
            .push((name.to_string(), content.to_string()));
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String, ChannelError> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> Result<bool, ChannelError> {
        Ok(self.files.lock().contains_key(name))
    }

    fn delete(&self, name: &str) -> Result<(), ChannelError> {
        self.files
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let channel = MemoryChannel::new();
        assert!(!channel.exists("a").unwrap());

        channel.write("a", "one").unwrap();
        channel.write("a", "two").unwrap();
        assert_eq!(channel.read("a").unwrap(), "two");
        assert_eq!(channel.writes_to("a"), vec!["one", "two"]);

        channel.delete("a").unwrap();
        assert!(!channel.exists("a").unwrap());
        assert!(matches!(channel.read("a"), Err(ChannelError::NotFound(_))));
        assert!(matches!(channel.delete("a"), Err(ChannelError::NotFound(_))));
    }

    #[test]
    fn test_injected_write_failure() {
        let channel = MemoryChannel::new();
        channel.set_fail_writes(true);

        assert!(matches!(
            channel.write("a", "x"),
            Err(ChannelError::WriteRejected { .. })
        ));
        assert!(channel.names().is_empty());
        assert!(channel.writes_to("a").is_empty());

        channel.set_fail_writes(false);
        channel.write("a", "x").unwrap();
        assert_eq!(channel.names(), vec!["a"]);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use framerelay_protocol::{Level, LevelMask, RelayEvent};

use crate::buffer::RingBuffer;
use crate::options::EventCallback;

/// Default per-frame history: 1000 events.
pub const DEFAULT_CAPACITY: usize = 1000;

/// History of one frame.
#[derive(Debug, Clone)]
pub struct FrameLog {
    events: RingBuffer<RelayEvent>,
    levels_seen: LevelMask,
}

impl FrameLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RingBuffer::new(capacity),
            levels_seen: LevelMask::NONE,
        }
    }

    pub fn record(&mut self, event: RelayEvent) {
        self.levels_seen.insert(event.envelope.level);
        self.events.push(event);
    }

    /// Buffered events, oldest first.
    pub fn events(&self) -> &RingBuffer<RelayEvent> {
        &self.events
    }

    /// Buffered events at `level`, oldest first.
    pub fn at_level(&self, level: Level) -> Vec<&RelayEvent> {
        self.events
            .iter()
            .filter(|e| e.envelope.level == level)
            .collect()
    }

    /// Every level received since the last clear, including evicted events.
    pub fn levels_seen(&self) -> LevelMask {
        self.levels_seen
    }

    /// Events pushed out of the buffer by newer ones.
    pub fn evicted(&self) -> u64 {
        self.events.evicted()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.levels_seen = LevelMask::NONE;
    }
}

/// Accepted events from every frame, buffered per frame.
///
/// Frames are told apart by the envelope's session id, or by origin when it
/// carries none.
#[derive(Debug, Clone)]
pub struct FrameLogStore {
    frames: HashMap<String, FrameLog>,
    capacity: usize,
}

impl FrameLogStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A store keeping at most `capacity` events per frame.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: HashMap::new(),
            capacity,
        }
    }

    /// The key `event` is filed under.
    pub fn key_of(event: &RelayEvent) -> &str {
        event
            .envelope
            .session_id
            .as_deref()
            .unwrap_or(event.origin.as_str())
    }

    pub fn record(&mut self, event: RelayEvent) {
        let key = Self::key_of(&event).to_owned();
        self.frames
            .entry(key)
            .or_insert_with(|| FrameLog::new(self.capacity))
            .record(event);
    }

    pub fn frame(&self, key: &str) -> Option<&FrameLog> {
        self.frames.get(key)
    }

    /// Keys of every frame heard from, sorted.
    pub fn frame_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.frames.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Forgets a frame, e.g. once it is removed from the page.
    pub fn remove_frame(&mut self, key: &str) -> Option<FrameLog> {
        self.frames.remove(key)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// An `on_event` callback recording into `store`.
    pub fn callback(store: &Arc<Mutex<FrameLogStore>>) -> EventCallback {
        let store = Arc::clone(store);
        Arc::new(move |event: &RelayEvent| {
            if let Ok(mut store) = store.lock() {
                store.record(event.clone());
            }
        })
    }
}

impl Default for FrameLogStore {
    fn default() -> Self {
        Self::new()
    }
}

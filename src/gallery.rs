//! Saved snapshots and deferred loading.
//!
//! The [`Gallery`] is append-only and ordered newest first. Each
//! [`Snapshot`] is an immutable encoded payload identified by a short
//! SHA-256 prefix of its bytes.
//!
//! [`VisibilityTracker`] decides when a gallery entry should be loaded: an
//! entry loads the first time at least 10% of it falls inside the viewport
//! grown by a 50px margin, and is never reported again.

use crate::imaging::{Dimensions, OutputFormat};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hex characters of the SHA-256 digest kept as a snapshot id.
const ID_LEN: usize = 12;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// One saved, encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    id: String,
    bytes: Vec<u8>,
    format: OutputFormat,
    dimensions: Dimensions,
    created_ms: u64,
}

impl Snapshot {
    pub fn new(bytes: Vec<u8>, format: OutputFormat, dimensions: Dimensions, created_ms: u64) -> Self {
        let digest = format!("{:x}", Sha256::digest(&bytes));
        Self {
            id: digest[..ID_LEN].to_string(),
            bytes,
            format,
            dimensions,
            created_ms,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn created_ms(&self) -> u64 {
        self.created_ms
    }

    /// `edited-image-<created millis>.<ext>`
    pub fn download_name(&self) -> String {
        download_name(self.created_ms, self.format)
    }
}

/// File name for an exported image created at `millis`.
pub fn download_name(millis: u64, format: OutputFormat) -> String {
    format!("edited-image-{millis}.{}", format.extension())
}

/// Most-recent-first collection of snapshots.
#[derive(Debug, Default)]
pub struct Gallery {
    snapshots: VecDeque<Snapshot>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front and return the stored snapshot.
    pub fn push(&mut self, snapshot: Snapshot) -> &Snapshot {
        log::info!(
            "Gallery: added {} ({}x{}, {} bytes)",
            snapshot.id,
            snapshot.dimensions.width,
            snapshot.dimensions.height,
            snapshot.bytes.len()
        );
        self.snapshots.push_front(snapshot);
        &self.snapshots[0]
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }
}

// =============================================================================
// Deferred loading
// =============================================================================

/// Vertical span of an item or of the viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f32,
    pub height: f32,
}

impl Span {
    pub fn new(top: f32, height: f32) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Reports each tracked item once, the first time it becomes visible.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    root_margin: f32,
    threshold: f32,
    items: Vec<(Span, bool)>,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(50.0, 0.1)
    }
}

impl VisibilityTracker {
    pub fn new(root_margin: f32, threshold: f32) -> Self {
        Self {
            root_margin,
            threshold: threshold.clamp(0.0, 1.0),
            items: Vec::new(),
        }
    }

    /// Start tracking an item; returns its index.
    pub fn track(&mut self, span: Span) -> usize {
        self.items.push((span, false));
        self.items.len() - 1
    }

    /// Track `count` cells laid out row-major in a grid of `columns`.
    pub fn track_grid(&mut self, count: usize, columns: usize, row_height: f32, gap: f32) {
        let columns = columns.max(1);
        for i in 0..count {
            let row = (i / columns) as f32;
            self.track(Span::new(row * (row_height + gap), row_height));
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.items.get(index).is_some_and(|(_, seen)| *seen)
    }

    /// Indices that became visible for the first time in `viewport`.
    pub fn poll(&mut self, viewport: Span) -> Vec<usize> {
        let root = Span::new(
            viewport.top - self.root_margin,
            viewport.height + 2.0 * self.root_margin,
        );
        let threshold = self.threshold;
        let mut newly = Vec::new();
        for (index, (span, seen)) in self.items.iter_mut().enumerate() {
            if !*seen && intersects(*span, root, threshold) {
                *seen = true;
                newly.push(index);
            }
        }
        if !newly.is_empty() {
            log::debug!("Visibility: {} item(s) entered view", newly.len());
        }
        newly
    }
}

fn intersects(item: Span, root: Span, threshold: f32) -> bool {
    let overlap = item.bottom().min(root.bottom()) - item.top.max(root.top);
    if item.height == 0.0 {
        return item.top >= root.top && item.top <= root.bottom();
    }
    overlap > 0.0 && overlap / item.height >= threshold
}

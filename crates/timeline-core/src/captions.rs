//! Caption store and invalidation lifecycle.
//!
//! Caption timestamps are absolute timeline times. Any edit that moves
//! media clips makes them stale, so the timeline store clears this store
//! on every such edit and records why.

use std::sync::Arc;

use montage_project_model::{
    Caption, CaptionConfig, CaptionConfigPatch, CaptionDocument, CaptionInvalidation,
    CaptionPosition,
};

/// A snapshot of caption state.
#[derive(Debug, Clone, Default)]
pub struct CaptionState {
    pub captions: Arc<Vec<Caption>>,
    pub enabled: bool,
    pub position: CaptionPosition,
    pub config: CaptionConfig,
    pub last_invalidated: Option<CaptionInvalidation>,
}

impl CaptionState {
    /// First caption whose `[start, end]` contains `t`.
    pub fn caption_at(&self, t: f64) -> Option<&Caption> {
        self.captions.iter().find(|c| c.contains(t))
    }
}

/// Owner of generated captions and their display settings.
#[derive(Debug, Clone, Default)]
pub struct CaptionStore {
    state: CaptionState,
}

impl CaptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: &CaptionDocument) -> Self {
        Self {
            state: CaptionState {
                captions: Arc::new(doc.captions.clone()),
                enabled: doc.enabled,
                position: doc.position,
                config: doc.config.clone(),
                last_invalidated: doc.last_invalidated.clone(),
            },
        }
    }

    pub fn to_document(&self) -> CaptionDocument {
        CaptionDocument {
            captions: self.state.captions.as_ref().clone(),
            enabled: self.state.enabled,
            position: self.state.position,
            config: self.state.config.clone(),
            last_invalidated: self.state.last_invalidated.clone(),
        }
    }

    /// Current snapshot (cheap clone).
    pub fn snapshot(&self) -> CaptionState {
        self.state.clone()
    }

    pub fn state(&self) -> &CaptionState {
        &self.state
    }

    pub fn captions(&self) -> &[Caption] {
        &self.state.captions
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn position(&self) -> CaptionPosition {
        self.state.position
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.state.config
    }

    pub fn last_invalidated(&self) -> Option<&CaptionInvalidation> {
        self.state.last_invalidated.as_ref()
    }

    /// Replace all captions with a fresh transcription result.
    /// Clears the invalidation record.
    pub fn set_captions(&mut self, mut captions: Vec<Caption>) {
        captions.sort_by(|a, b| a.start.total_cmp(&b.start));
        tracing::info!(count = captions.len(), "Captions updated");
        self.state.captions = Arc::new(captions);
        self.state.last_invalidated = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    pub fn set_position(&mut self, position: CaptionPosition) {
        self.state.position = position;
    }

    pub fn update_config(&mut self, patch: &CaptionConfigPatch) {
        self.state.config = patch.apply(&self.state.config);
    }

    /// Edit the text of one caption. Returns false if the id is unknown.
    pub fn update_caption_text(&mut self, id: &str, text: &str) -> bool {
        if !self.state.captions.iter().any(|c| c.id == id) {
            return false;
        }
        let captions = self
            .state
            .captions
            .iter()
            .map(|c| {
                if c.id == id {
                    Caption {
                        text: text.to_string(),
                        ..c.clone()
                    }
                } else {
                    c.clone()
                }
            })
            .collect();
        self.state.captions = Arc::new(captions);
        true
    }

    /// Remove one caption. Returns false if the id is unknown.
    pub fn remove_caption(&mut self, id: &str) -> bool {
        if !self.state.captions.iter().any(|c| c.id == id) {
            return false;
        }
        let captions = self
            .state
            .captions
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        self.state.captions = Arc::new(captions);
        true
    }

    /// Discard all captions, recording `reason`.
    ///
    /// Does nothing when there are no captions, so the previous
    /// invalidation record is kept. Returns true if captions were dropped.
    pub fn clear(&mut self, reason: &str) -> bool {
        if self.state.captions.is_empty() {
            return false;
        }
        tracing::info!(
            reason,
            dropped = self.state.captions.len(),
            "Captions invalidated"
        );
        self.state.captions = Arc::new(Vec::new());
        self.state.last_invalidated = Some(CaptionInvalidation {
            reason: reason.to_string(),
            at: chrono::Utc::now(),
        });
        true
    }

    /// First caption whose `[start, end]` contains `t`.
    pub fn caption_at(&self, t: f64) -> Option<&Caption> {
        self.state.caption_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(id: &str, start: f64, end: f64, text: &str) -> Caption {
        Caption {
            id: id.to_string(),
            start,
            end,
            text: text.to_string(),
            source_clip_id: Some("clip-1".to_string()),
        }
    }

    #[test]
    fn test_defaults() {
        let store = CaptionStore::new();
        assert!(store.captions().is_empty());
        assert!(!store.is_enabled());
        assert_eq!(store.position(), CaptionPosition::Bottom);
        assert!(store.last_invalidated().is_none());
    }

    #[test]
    fn test_set_captions_sorts_and_resets_invalidation() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![caption("a", 0.0, 1.0, "one")]);
        assert!(store.clear("Clip deleted"));
        assert!(store.last_invalidated().is_some());

        store.set_captions(vec![
            caption("b", 2.0, 3.0, "late"),
            caption("c", 0.0, 1.0, "early"),
        ]);
        assert_eq!(store.captions()[0].id, "c");
        assert!(store.last_invalidated().is_none());
    }

    #[test]
    fn test_clear_records_reason() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![caption("a", 0.0, 1.0, "one")]);
        assert!(store.clear("Clip trimmed"));
        assert!(store.captions().is_empty());
        assert_eq!(store.last_invalidated().unwrap().reason, "Clip trimmed");
    }

    #[test]
    fn test_clear_when_empty_is_noop() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![caption("a", 0.0, 1.0, "one")]);
        store.clear("first");
        assert!(!store.clear("second"));
        assert_eq!(store.last_invalidated().unwrap().reason, "first");
    }

    #[test]
    fn test_caption_at_inclusive_first_match() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![
            caption("a", 0.0, 1.0, "one"),
            caption("b", 1.0, 2.0, "two"),
        ]);
        assert_eq!(store.caption_at(0.5).unwrap().text, "one");
        assert_eq!(store.caption_at(1.0).unwrap().text, "one");
        assert_eq!(store.caption_at(2.0).unwrap().text, "two");
        assert!(store.caption_at(2.5).is_none());
    }

    #[test]
    fn test_snapshot_unaffected_by_later_edits() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![caption("a", 0.0, 1.0, "one")]);
        let before = store.snapshot();
        store.clear("Clip added");
        assert_eq!(before.captions.len(), 1);
        assert!(store.captions().is_empty());
    }

    #[test]
    fn test_edit_and_remove_caption() {
        let mut store = CaptionStore::new();
        store.set_captions(vec![
            caption("a", 0.0, 1.0, "one"),
            caption("b", 1.0, 2.0, "two"),
        ]);
        assert!(store.update_caption_text("a", "uno"));
        assert!(store.remove_caption("b"));
        assert!(!store.remove_caption("b"));
        assert_eq!(store.captions().len(), 1);
        assert_eq!(store.captions()[0].text, "uno");
    }

    #[test]
    fn test_document_roundtrip_keeps_settings() {
        let mut store = CaptionStore::new();
        store.set_enabled(true);
        store.set_position(CaptionPosition::Top);
        store.set_captions(vec![caption("a", 0.0, 1.0, "one")]);

        let restored = CaptionStore::from_document(&store.to_document());
        assert!(restored.is_enabled());
        assert_eq!(restored.position(), CaptionPosition::Top);
        assert_eq!(restored.captions().len(), 1);
    }
}

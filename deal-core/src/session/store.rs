//! Live override state for one property.
//!
//! Every edit updates the live record, pushes a snapshot onto the history and
//! hands the new record to the sink. Undo and redo restore a snapshot and hand
//! it to the sink without pushing.

use std::sync::Arc;

use tracing::debug;

use super::SessionError;
use super::history::HistoryStack;
use crate::db::OverrideSink;
use crate::models::{AnalysisSnapshot, Property, PropertyOverride};

pub struct OverrideStore {
    property: Property,
    overrides: PropertyOverride,
    history: HistoryStack<AnalysisSnapshot>,
    sink: Arc<dyn OverrideSink>,
}

impl OverrideStore {
    /// Starts tracking `property` with its stored override, or an empty one,
    /// and records the initial snapshot.
    pub fn load(
        property: Property,
        stored: Option<PropertyOverride>,
        mut history: HistoryStack<AnalysisSnapshot>,
        sink: Arc<dyn OverrideSink>,
    ) -> Self {
        let overrides = stored.unwrap_or_default();
        history.push(AnalysisSnapshot::capture(&property, &overrides));

        Self {
            property,
            overrides,
            history,
            sink,
        }
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn overrides(&self) -> &PropertyOverride {
        &self.overrides
    }

    pub fn history(&self) -> &HistoryStack<AnalysisSnapshot> {
        &self.history
    }

    /// Lays `patch` over the live override.
    pub fn merge(
        &mut self,
        patch: &PropertyOverride,
    ) {
        self.overrides = self.overrides.merge(patch);
        self.commit();
    }

    /// Replaces the live override with an empty one.
    pub fn reset(&mut self) {
        self.overrides = PropertyOverride::default();
        self.commit();
    }

    /// Replaces a hand-entered property's source record.
    pub fn replace_property(
        &mut self,
        mut property: Property,
    ) -> Result<(), SessionError> {
        if !self.property.listing_id.is_custom() {
            return Err(SessionError::NotCustom(self.property.listing_id.clone()));
        }

        property.listing_id = self.property.listing_id.clone();
        self.property = property;
        self.commit();
        Ok(())
    }

    /// Restores the previous snapshot. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restores the next snapshot. Returns `false` at the tip.
    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self) {
        self.history
            .push(AnalysisSnapshot::capture(&self.property, &self.overrides));
        debug!(
            listing = %self.property.listing_id,
            depth = self.history.len(),
            "recorded edit"
        );
        self.persist();
    }

    fn restore(
        &mut self,
        snapshot: AnalysisSnapshot,
    ) {
        self.property = snapshot.property;
        self.overrides = snapshot.overrides;
        debug!(
            listing = %self.property.listing_id,
            cursor = ?self.history.cursor(),
            "restored snapshot"
        );
        self.persist();
    }

    fn persist(&self) {
        self.sink.submit(&self.property.listing_id, &self.overrides);
    }
}

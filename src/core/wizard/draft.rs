//! Draft state store driven by tagged patch actions.

use chrono::{DateTime, Utc};
use paddock_types::IdGenerator;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Aggregate edited field-by-field across wizard steps.
pub trait DraftRecord: Clone + Default + fmt::Debug + Send + Sync + 'static {
    type Patch: Clone + fmt::Debug + Send + Sync;

    /// Apply `patch` and return the patch that restores the previous value.
    fn apply(&mut self, patch: Self::Patch) -> Self::Patch;

    /// Whether [`DraftStore::undo`] may revert `patch`.
    ///
    /// Patches that mirror state held outside the draft return false and stay in place when
    /// later entries are undone. Each patch touches one field, so reverting around them keeps
    /// the other fields consistent.
    fn is_undoable(_patch: &Self::Patch) -> bool {
        true
    }
}

/// One applied action kept for auditing and undo.
#[derive(Debug, Clone)]
pub struct AppliedPatch<P> {
    pub action: P,
    pub inverse: P,
    /// Inverses of follow-up patches applied in the same step, in application order.
    pub linked: Vec<P>,
    pub applied_at: DateTime<Utc>,
}

/// Holds the mutable draft of one wizard session plus its provisional identifier.
pub struct DraftStore<D: DraftRecord> {
    draft: D,
    provisional_id: Uuid,
    history: Vec<AppliedPatch<D::Patch>>,
    ids: Arc<dyn IdGenerator>,
}

impl<D: DraftRecord> fmt::Debug for DraftStore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftStore")
            .field("draft", &self.draft)
            .field("provisional_id", &self.provisional_id)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl<D: DraftRecord> DraftStore<D> {
    /// Empty draft with a freshly minted provisional identifier.
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        let provisional_id = ids.new_id();
        DraftStore {
            draft: D::default(),
            provisional_id,
            history: Vec::new(),
            ids,
        }
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn provisional_id(&self) -> Uuid {
        self.provisional_id
    }

    pub fn patch(&mut self, action: D::Patch) {
        self.patch_linked(action, Vec::new());
    }

    /// Apply `action` and its dependent `follow_ups` as one history entry, undone together.
    pub fn patch_linked(&mut self, action: D::Patch, follow_ups: Vec<D::Patch>) {
        tracing::debug!(?action, follow_ups = follow_ups.len(), "draft patched");
        let inverse = self.draft.apply(action.clone());
        let linked = follow_ups
            .into_iter()
            .map(|follow_up| self.draft.apply(follow_up))
            .collect();
        self.history.push(AppliedPatch {
            action,
            inverse,
            linked,
            applied_at: Utc::now(),
        });
    }

    pub fn patch_all<I: IntoIterator<Item = D::Patch>>(&mut self, actions: I) {
        for action in actions {
            self.patch(action);
        }
    }

    /// Revert the most recent undoable patch, returning the action that was undone.
    pub fn undo(&mut self) -> Option<D::Patch> {
        let position = self
            .history
            .iter()
            .rposition(|applied| D::is_undoable(&applied.action))?;
        let applied = self.history.remove(position);
        for inverse in applied.linked.into_iter().rev() {
            self.draft.apply(inverse);
        }
        self.draft.apply(applied.inverse);
        Some(applied.action)
    }

    pub fn history(&self) -> &[AppliedPatch<D::Patch>] {
        &self.history
    }

    /// Replace the draft with `seed` (or an empty template) and mint a new provisional id.
    pub fn reset(&mut self, seed: Option<D>) {
        self.draft = seed.unwrap_or_default();
        self.history.clear();
        self.provisional_id = self.ids.new_id();
    }
}

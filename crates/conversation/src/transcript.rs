//! The in-memory transcript and its reconciliation rules.
//!
//! Every mutation the controller performs goes through [`Transcript`], which
//! does no I/O. After each call:
//!
//! - no two entries share a durable id
//! - entries are sorted by `created_at`, ties in insertion order
//! - each `send` owns exactly one slot, addressed by the placeholder's local id

use chat_core::{LocalId, Message, MessageStatus, OwnerId, Sender, StoredMessage};
use chrono::{DateTime, Utc};

/// How far a pending slot has been reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Placeholder still shown, nothing heard yet.
    Pending,
    /// Resolved from the reply service response; a later push may still
    /// overwrite it.
    Resolved,
    /// The reply could not be obtained; a later push may still fill it.
    Failed,
    /// Filled by a pushed store row. Final.
    Pushed,
}

impl SlotState {
    fn open_to_push(self) -> bool {
        !matches!(self, SlotState::Pushed)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: LocalId,
    state: SlotState,
}

/// Local outcome of a reply request, applied to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: String,
    pub status: MessageStatus,
}

impl Resolution {
    pub fn confirmed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            status: MessageStatus::Confirmed,
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            status: MessageStatus::Failed,
        }
    }
}

/// What [`Transcript::resolve_slot`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The placeholder now shows the resolution.
    Applied,
    /// A pushed row already filled the slot; the resolution was dropped.
    SupersededByPush,
    /// The slot was resolved or failed before; nothing changed.
    AlreadyResolved,
    /// The slot no longer exists (cleared or owner switched).
    Missing,
}

/// What [`Transcript::apply_remote`] did with a pushed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteInsert {
    /// Row belongs to another owner, or no owner is active.
    ForeignOwner,
    /// An entry with this durable id already exists.
    Duplicate,
    /// The row is the persisted copy of a local message; its id was swapped in.
    Persisted(LocalId),
    /// The row filled a reply slot.
    FilledSlot(LocalId),
    /// The row was inserted as a new entry.
    Appended(LocalId),
}

/// Ordered message list for one conversation owner.
#[derive(Debug, Default)]
pub struct Transcript {
    owner: Option<OwnerId>,
    messages: Vec<Message>,
    slots: Vec<Slot>,
    // Never reset, so ids from a previous owner's in-flight sends cannot
    // address entries of the next one.
    next_local: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active owner, if a history has been loaded.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of slots still showing their placeholder.
    pub fn pending_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Pending)
            .count()
    }

    pub fn slot_state(&self, slot: LocalId) -> Option<SlotState> {
        self.slots.iter().find(|s| s.id == slot).map(|s| s.state)
    }

    pub fn get(&self, local_id: LocalId) -> Option<&Message> {
        self.messages.iter().find(|m| m.local_id == local_id)
    }

    /// Replace everything with `rows` for `owner`.
    pub fn reset(&mut self, owner: OwnerId, rows: Vec<StoredMessage>) {
        self.owner = Some(owner);
        self.slots.clear();
        self.messages = Vec::with_capacity(rows.len());
        for row in rows {
            let local_id = self.allocate();
            self.messages.push(Message::from_stored(local_id, row));
        }
        self.messages.sort_by_key(|m| m.created_at);
    }

    /// Drop every entry and slot, keeping the owner.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.slots.clear();
    }

    /// Drop everything including the owner.
    pub fn close(&mut self) {
        self.clear();
        self.owner = None;
    }

    /// Append the user's outgoing message. It is shown as confirmed right away.
    pub fn push_user(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> Option<LocalId> {
        self.push_local(Sender::User, content.into(), at, MessageStatus::Confirmed)
    }

    /// Append a pending bot placeholder and open a slot for it.
    pub fn open_slot(&mut self, placeholder: impl Into<String>, at: DateTime<Utc>) -> Option<LocalId> {
        let id = self.push_local(Sender::Bot, placeholder.into(), at, MessageStatus::Pending)?;
        self.slots.push(Slot {
            id,
            state: SlotState::Pending,
        });
        Some(id)
    }

    /// Record the durable id of a locally created message, in place.
    ///
    /// Returns false if the entry is gone or already has a durable id.
    pub fn assign_durable(&mut self, local_id: LocalId, durable_id: impl Into<String>) -> bool {
        let durable_id = durable_id.into();
        let Some(index) = self.index_of(local_id) else {
            return false;
        };
        if self.messages[index].durable_id.is_some() {
            return false;
        }

        self.messages[index].durable_id = Some(durable_id.clone());
        self.messages.retain(|m| {
            m.local_id == local_id || m.durable_id.as_deref() != Some(durable_id.as_str())
        });
        true
    }

    /// Apply the reply service outcome to a slot.
    ///
    /// A slot already filled by a push keeps the pushed row.
    pub fn resolve_slot(&mut self, slot: LocalId, resolution: Resolution) -> SlotOutcome {
        let Some(state) = self.slot_state(slot) else {
            return SlotOutcome::Missing;
        };
        match state {
            SlotState::Pushed => SlotOutcome::SupersededByPush,
            SlotState::Resolved | SlotState::Failed => SlotOutcome::AlreadyResolved,
            SlotState::Pending => {
                let Some(index) = self.index_of(slot) else {
                    return SlotOutcome::Missing;
                };
                let next = match resolution.status {
                    MessageStatus::Failed => SlotState::Failed,
                    _ => SlotState::Resolved,
                };
                let message = &mut self.messages[index];
                message.content = resolution.content;
                message.status = resolution.status;
                self.set_slot_state(slot, next);
                SlotOutcome::Applied
            }
        }
    }

    /// Reconcile a row pushed by the store.
    ///
    /// A bot row whose `client_ref` names a local id fills that slot while it
    /// is open to pushes, even after a local resolution, and never any other
    /// slot. A bot row without a usable `client_ref` fills only the oldest
    /// pending slot. User rows naming a local message complete its id swap.
    /// Everything else is inserted in `created_at` order.
    pub fn apply_remote(&mut self, row: StoredMessage) -> RemoteInsert {
        if self.owner.as_ref() != Some(&row.owner) {
            return RemoteInsert::ForeignOwner;
        }
        if self
            .messages
            .iter()
            .any(|m| m.durable_id.as_deref() == Some(row.id.as_str()))
        {
            return RemoteInsert::Duplicate;
        }

        let referenced = row
            .client_ref
            .as_deref()
            .and_then(|r| r.parse::<LocalId>().ok());

        match row.sender {
            Sender::User => {
                if let Some(local_id) = referenced {
                    let unpersisted = self
                        .get(local_id)
                        .is_some_and(|m| m.sender == Sender::User && m.durable_id.is_none());
                    if unpersisted && self.assign_durable(local_id, row.id.clone()) {
                        return RemoteInsert::Persisted(local_id);
                    }
                }
            }
            Sender::Bot => {
                if let Some(slot) = self.slot_for_push(referenced) {
                    if let Some(index) = self.index_of(slot) {
                        let message = &mut self.messages[index];
                        message.durable_id = Some(row.id);
                        message.content = row.content;
                        message.status = MessageStatus::Confirmed;
                        self.set_slot_state(slot, SlotState::Pushed);
                        return RemoteInsert::FilledSlot(slot);
                    }
                }
            }
        }

        let local_id = self.allocate();
        let position = self
            .messages
            .partition_point(|m| m.created_at <= row.created_at);
        self.messages
            .insert(position, Message::from_stored(local_id, row));
        RemoteInsert::Appended(local_id)
    }

    fn slot_for_push(&self, referenced: Option<LocalId>) -> Option<LocalId> {
        match referenced {
            Some(r) => self
                .slots
                .iter()
                .find(|s| s.id == r && s.state.open_to_push())
                .map(|s| s.id),
            None => self
                .slots
                .iter()
                .find(|s| s.state == SlotState::Pending)
                .map(|s| s.id),
        }
    }

    fn push_local(
        &mut self,
        sender: Sender,
        content: String,
        at: DateTime<Utc>,
        status: MessageStatus,
    ) -> Option<LocalId> {
        let owner = self.owner.clone()?;
        let local_id = self.allocate();
        let position = self.messages.partition_point(|m| m.created_at <= at);
        self.messages.insert(
            position,
            Message {
                local_id,
                durable_id: None,
                owner,
                sender,
                content,
                created_at: at,
                status,
            },
        );
        Some(local_id)
    }

    fn allocate(&mut self) -> LocalId {
        self.next_local += 1;
        LocalId(self.next_local)
    }

    fn index_of(&self, local_id: LocalId) -> Option<usize> {
        self.messages.iter().position(|m| m.local_id == local_id)
    }

    fn set_slot_state(&mut self, slot: LocalId, state: SlotState) {
        if let Some(s) = self.slots.iter_mut().find(|s| s.id == slot) {
            s.state = state;
        }
    }
}

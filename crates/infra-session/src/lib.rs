// EduQueue Infrastructure - Live Session Adapters
// Implements: VoiceCapability (PresenceTable), Notifier (OutboxNotifier)
//
// The chat bridge feeds presence in and drains notices and move requests out.

mod outbox;
mod presence;

pub use outbox::{OutboxEntry, OutboxNotifier, OutboxRecipient};
pub use presence::{MoveRequest, PresenceTable, PresenceUpdate};

fn timestamp(millis: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

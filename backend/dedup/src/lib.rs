pub mod kv;
pub mod ledger;
pub mod slot;

pub use kv::{KvStore, MemoryKv};
pub use ledger::{DedupLedger, ReminderKind};
pub use slot::{DeadlineSlot, DeadlineSlots};

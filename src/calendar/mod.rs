pub mod date_key;
pub mod event;
pub mod filter;
pub mod store;
pub mod tags;

pub use date_key::{date_key, DateKey};
pub use event::{Category, Event, EventDraft, EventPatch};
pub use filter::{CategoryFilter, FilterState};
pub use store::{EventMap, Store};
pub use tags::TagRegistry;

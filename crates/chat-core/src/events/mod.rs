//! Store change notifications

mod store_event;

pub use store_event::StoreEvent;

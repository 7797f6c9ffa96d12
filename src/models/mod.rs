//! Data models for listharvest.

mod item;

pub use item::CollectedItem;

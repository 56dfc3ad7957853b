//! View models for the inventory table.
//!
//! Everything here is pure: rows are rendered from already-loaded
//! [`InventoryRow`](crate::dto::inventory::InventoryRow)s with the current
//! time injected, so the same input always yields the same output.

pub mod animation;
pub mod menu;
pub mod row;
pub mod tiers;

pub use animation::RevealAnimation;
pub use menu::{EditMenu, MenuAction};
pub use row::{format_expiry_date, Badge, InventoryRowView, InventoryTable};
pub use tiers::{days_until, BadgeTone, ExpiryTier, QuantityTier};

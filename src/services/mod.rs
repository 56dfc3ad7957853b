pub mod hospitals;
pub mod inventory;

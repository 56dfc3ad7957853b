pub mod department;
pub mod hospital;
pub mod item;
pub mod medical_inventory;

//! Business logic services for the StockTrack backend

pub mod alerts;
pub mod authorization;
pub mod inventory;

pub use alerts::AlertService;
pub use authorization::AuthorizationService;
pub use inventory::InventoryService;

//! HTTP handlers for the StockTrack backend

mod health;
mod inventory;

pub use health::*;
pub use inventory::*;

//! Database models for the StockTrack inventory backend

mod inventory;
mod product;
mod user;

pub use inventory::*;
pub use product::*;
pub use user::*;

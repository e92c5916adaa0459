//! SeaORM entity models
//!
//! Database entities for PropPilot

mod property;

pub use property::{Column as PropertyColumn, Entity as PropertyEntity, Model as Property};

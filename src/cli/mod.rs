//! Terminal presentation of the conversion flow

pub mod convert;
pub mod currencies;
pub mod interactive;
pub mod render;
pub mod setup;
pub mod ui;

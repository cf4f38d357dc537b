//! Systems module - all ECS systems for the snooker table.

pub mod aiming;
pub mod debug;
pub mod fx;
pub mod impact;
pub mod shot;

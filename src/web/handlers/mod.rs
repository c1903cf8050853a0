// HTTP handlers, one module per route group.

pub mod health;
pub mod validate;

#[path = "../support/mod.rs"]
mod support;

mod cancellation;
mod failures;
mod lifecycle;
mod modes;
mod scenario;

//! Plan executors.

mod webhook;

pub use webhook::WebhookPlanExecutor;

//! Policy evaluation for proposed actions.
//!
//! A proposed action is classified by destructiveness ([`ActionCategory`]),
//! its confidence is banded ([`ConfidenceBand`]), the cluster health is
//! banded ([`ClusterStatus`]), and a fixed rule cascade decides whether the
//! action may run ([`evaluate`]).

pub mod bands;
pub mod category;
pub mod evaluator;

pub use bands::{ClusterStatus, ConfidenceBand};
pub use category::ActionCategory;
pub use evaluator::{PolicyDecision, PolicyInput, PolicyMode, evaluate};

//! Application features: requests and their handlers, grouped by area

pub mod articles;

use crate::mediator::{Mediator, PerformanceLoggingBehavior, ValidationBehavior};
use crate::storage::ArticleStore;
use std::sync::Arc;

/// Build the mediator with every feature handler and the standard behaviors
///
/// Behaviors run in order: validation first, then performance logging.
pub fn build_mediator(
    store: Arc<dyn ArticleStore>,
    performance: Arc<PerformanceLoggingBehavior>,
) -> Mediator {
    let builder = Mediator::builder()
        .add_behavior(ValidationBehavior)
        .add_shared_behavior(performance);

    articles::register(builder, store).build()
}

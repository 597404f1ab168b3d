//! In-memory widgets for exercising the bridge without a platform.
//!
//! [`TestFactory`] implements a small schema whose widgets record everything that
//! happens to them in shared [`TestView`] handles. [`LogicalNode`] describes a
//! tree the way a producer would and [`Emitter`] turns it into a change batch
//! that obeys the emission order.

mod emit;
mod schema;
mod view;
mod widgets;

pub use emit::{Emitter, LogicalNode, button, column, row, scroll_view, split, text, video};
pub use schema::{tags, test_schema};
pub use view::{Background, FlexWeight, TestView, ViewChildren, ViewTree};
pub use widgets::TestFactory;

/// Install a test-writer subscriber once. Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_test_writer()
        .try_init();
}


pub(crate) use fixtures::*;

mod context_tests;
mod dispatch_tests;
mod form_tracking_tests;

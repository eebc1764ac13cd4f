//! Per-invocation panic isolation for handler futures.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use afterschool_core::error::EventError;
use afterschool_core::handler::HandlerResult;
use futures::FutureExt;

/// Polls `invocation` to completion, turning a panic into a handler error so
/// one faulty handler cannot take down the bus or a subscriber worker.
pub(crate) async fn isolated<F>(invocation: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(invocation).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(EventError::Handler(format!(
            "handler panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

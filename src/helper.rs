//! Miscellaneous convenience methods

use anyhow::{anyhow, Result};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Run a handler future, turning a panic inside it into an error so that one misbehaving module
/// cannot take the event loop down with it.
pub async fn contain<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(anyhow!("panicked: {}", panic_message(&*panic))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn errors_pass_through() {
        let result: Result<()> = contain(async { Err(anyhow!("nope")) }).await;
        assert_eq!(result.unwrap_err().to_string(), "nope");
    }

    #[tokio::test]
    async fn panics_become_errors() {
        let result: Result<()> = contain(async {
            if true {
                panic!("boom {}", 1);
            }
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap_err().to_string(), "panicked: boom 1");
    }
}

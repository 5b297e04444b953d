use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::error::Elapsed;
use tokio::time::Timeout;

pub trait FutureTimeoutExt: Future + Sized {
    fn timeout(self, timeout: Duration) -> Timeout<Self> {
        tokio::time::timeout(timeout, self)
    }

    /// Same as [`timeout`](FutureTimeoutExt::timeout), but `None` means "wait forever".
    fn timeout_opt(self, timeout: Option<Duration>) -> TimeoutOpt<Self> {
        match timeout {
            Some(timeout) => TimeoutOpt::Bounded(tokio::time::timeout(timeout, self)),
            None => TimeoutOpt::Unbounded(self),
        }
    }
}
impl<T> FutureTimeoutExt for T where T: Future {}

#[pin_project::pin_project(project = TimeoutOptProj)]
pub enum TimeoutOpt<F> {
    Bounded(#[pin] Timeout<F>),
    Unbounded(#[pin] F),
}

impl<F> Future for TimeoutOpt<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            TimeoutOptProj::Bounded(timeout) => timeout.poll(cx),
            TimeoutOptProj::Unbounded(fut) => fut.poll(cx).map(Ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::FutureTimeoutExt;

    #[tokio::test]
    async fn timeout_fires() {
        let t0 = Instant::now();
        assert!(tokio::time::sleep(Duration::from_secs(3))
            .timeout(Duration::from_millis(100))
            .await
            .is_err());
        assert!(t0.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn timeout_opt_none_waits_for_completion() {
        let out = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            42
        }
        .timeout_opt(None)
        .await;
        assert_eq!(out.ok(), Some(42));
    }

    #[tokio::test]
    async fn timeout_opt_some_fires() {
        assert!(std::future::pending::<()>()
            .timeout_opt(Some(Duration::from_millis(20)))
            .await
            .is_err());
    }
}

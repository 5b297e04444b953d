//! Reduction accounting for cooperative scheduling.
//!
//! An actor is granted `budget` reductions per turn. Once the budget is spent, the next call to
//! [`Reductions::spend`] yields to the executor (requeueing the actor's task at the back of the
//! ready set) and starts a fresh turn.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub const DEFAULT_BUDGET: usize = 100;

#[derive(Debug, Clone)]
pub struct Reductions {
    budget: usize,
    left: usize,
    turns: u64,
}

impl Reductions {
    pub fn new(budget: usize) -> Self {
        let budget = budget.max(1);
        Self { budget, left: budget, turns: 0 }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Number of times the owner has been forced to yield.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Account for one unit of work; yields if the budget for this turn is exhausted.
    pub async fn spend(&mut self) {
        if self.left == 0 {
            self.left = self.budget;
            self.turns += 1;
            async_yield().await;
        }
        self.left -= 1;
    }
}

impl Default for Reductions {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET)
    }
}

pub async fn async_yield() {
    Yield(false).await
}

struct Yield(bool);

impl Future for Yield {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let flag = &mut self.as_mut().0;
        if !*flag {
            *flag = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::future_timeout_ext::FutureTimeoutExt;

    #[test]
    fn zero_budget_is_treated_as_one() {
        assert_eq!(Reductions::new(0).budget(), 1);
    }

    #[tokio::test]
    async fn yields_once_per_budget() {
        let mut reductions = Reductions::new(3);
        for _ in 0..9 {
            reductions.spend().await;
        }
        assert_eq!(reductions.turns(), 2);
        reductions.spend().await;
        assert_eq!(reductions.turns(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn busy_loop_with_reductions_lets_timer_fire() {
        let t0 = Instant::now();
        let busy = async {
            let mut reductions = Reductions::new(10);
            loop {
                std::thread::sleep(Duration::from_millis(1));
                reductions.spend().await;
            }
        };
        assert!(busy.timeout(Duration::from_millis(200)).await.is_err());
        assert!(t0.elapsed() < Duration::from_secs(2));
    }
}

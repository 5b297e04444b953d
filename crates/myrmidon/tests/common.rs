use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use myrmidon::actors::{Message, Pid, SystemConfig};
use myrmidon::{Runtime, RuntimeConfig};
use tokio::sync::mpsc;

#[allow(unused)]
pub const SMALL_SYSTEM_SIZE: usize = 64;

#[allow(unused)]
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

#[allow(unused)]
macro_rules! myrmidon_test {
    ($test_name: ident, $code: expr) => {
        #[cfg(test)]
        mod $test_name {
            #[allow(unused_imports)]
            use super::*;

            fn test() -> impl std::future::Future {
                $code
            }

            #[test]
            fn mt() {
                $crate::common::run(true, test());
            }
            #[test]
            fn st() {
                $crate::common::run(false, test());
            }
        }
    };
}

#[allow(unused)]
pub fn config(node_id: u32) -> RuntimeConfig {
    let exit_handler = Arc::new(myrmidon::actors::exit_handlers::LogExitHandler);
    RuntimeConfig {
        system: SystemConfig {
            node_id: Some(node_id),
            max_actors: SMALL_SYSTEM_SIZE,
            exit_handler,
            ..Default::default()
        },
        worker_threads: Some(2),
        ..Default::default()
    }
}

/// A node on its own tokio runtime; to be used from plain (non-async) tests.
#[allow(unused)]
pub fn runtime(node_id: u32) -> Runtime {
    init_logger();
    Runtime::new(config(node_id)).expect("Failed to start the runtime")
}

/// A node on the current tokio runtime.
#[allow(unused)]
pub fn runtime_here(node_id: u32) -> Runtime {
    Runtime::with_handle(config(node_id), tokio::runtime::Handle::current())
}

#[allow(unused)]
pub fn forwarder(runtime: &Runtime) -> (Pid, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pid = runtime
        .spawn(
            move |message: Message| {
                let tx = tx.to_owned();
                async move {
                    let _ = tx.send(message);
                }
            },
            10,
        )
        .expect("Failed to spawn forwarder");
    (pid, rx)
}

/// Receive on a plain thread, with a timeout.
#[allow(unused)]
pub fn recv_blocking<T>(runtime: &Runtime, rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    runtime
        .handle()
        .block_on(async { tokio::time::timeout(EXIT_TIMEOUT, rx.recv()).await })
        .expect("Timed out waiting for a message")
        .expect("Channel closed")
}

#[allow(unused)]
pub fn init_logger() {
    let _ = dotenv::dotenv();
    let _ = pretty_env_logger::try_init_timed();
}

#[allow(unused)]
pub fn run<F>(multi_thread: bool, f: F) -> F::Output
where
    F: Future,
{
    init_logger();

    if multi_thread {
        tokio::runtime::Builder::new_multi_thread()
    } else {
        tokio::runtime::Builder::new_current_thread()
    }
    .enable_all()
    .build()
    .expect("Failed to create runtime")
    .block_on(f)
}

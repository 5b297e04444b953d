use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use myrmidon_actors::{Message, Pid, System, SystemConfig};
use tokio::sync::mpsc;

#[allow(unused)]
pub const SMALL_SYSTEM_SIZE: usize = 10;

#[allow(unused)]
pub const SMALL_TIMEOUT: Duration = Duration::from_millis(300);
#[allow(unused)]
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(2);

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
pub fn system(max_actors: usize) -> System {
    system_with(SystemConfig { max_actors, ..Default::default() })
}

#[allow(unused)]
pub fn system_with(config: SystemConfig) -> System {
    let exit_handler = Arc::new(myrmidon_actors::exit_handlers::LogExitHandler);
    System::new(SystemConfig { exit_handler, ..config })
}

/// A push-mode actor forwarding everything it receives into the returned channel.
#[allow(unused)]
pub fn forwarder(system: &System) -> (Pid, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pid = system
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

#[allow(unused)]
pub async fn recv_data(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<u8> {
    let message = tokio::time::timeout(EXIT_TIMEOUT, rx.recv())
        .await
        .expect("Timed out waiting for a message")
        .expect("Channel closed");
    message.as_data().expect("Expected a data message").to_vec()
}

/// Poll `condition` until it holds, or panic after [`EXIT_TIMEOUT`].
#[allow(unused)]
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + EXIT_TIMEOUT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[allow(unused)]
pub fn run<F>(multi_thread: bool, f: F) -> F::Output
where
    F: Future,
{
    let _ = dotenv::dotenv();
    let _ = pretty_env_logger::try_init_timed();

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

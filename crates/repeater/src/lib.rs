//! repeater: randomized-interval UDP retransmission until cancelled or a
//! deadline expires.
//!
//! Used by both the server (to keep re-sending a response until `ACK`) and
//! the client (to keep re-sending a command, and later an `ACK`, until the
//! far side's reply satisfies it). Jitter matters: when many peers answer
//! a broadcast at once, unjittered retries would all collide on the same
//! tick.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Tuning knobs for a single repeater. Defaults match spec.md §4.1.
#[derive(Debug, Clone, Copy)]
pub struct RepeaterConfig {
    /// Upper bound of the `[0, interval_max]` uniform jitter window.
    pub interval_max: Duration,
    /// Hard wall-clock budget after which the repeater gives up.
    pub deadline: Duration,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        RepeaterConfig {
            interval_max: Duration::from_millis(200),
            deadline: Duration::from_secs(5),
        }
    }
}

/// A handle to a running retransmission task.
///
/// Dropping the handle does not cancel the task — call [`Repeater::cancel`]
/// explicitly, mirroring the spec's requirement that cancellation be an
/// observable signal rather than an implicit side effect of scope exit.
pub struct Repeater {
    cancel: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Repeater {
    /// Transmit `payload` to `dest` over `socket` immediately, then keep
    /// retransmitting at randomized intervals until [`Repeater::cancel`] is
    /// called or `config.deadline` elapses.
    pub fn spawn(
        socket: Arc<UdpSocket>,
        dest: SocketAddr,
        payload: Vec<u8>,
        config: RepeaterConfig,
    ) -> Self {
        let cancel = Arc::new(Notify::new());
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run(socket, dest, payload, config, task_cancel).await;
        });
        Repeater { cancel, handle }
    }

    /// Signal the task to stop. Takes effect within one jitter interval.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Wait for the task to finish (either cancelled or deadline-expired).
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

async fn run(
    socket: Arc<UdpSocket>,
    dest: SocketAddr,
    payload: Vec<u8>,
    config: RepeaterConfig,
    cancel: Arc<Notify>,
) {
    let mut rng = SmallRng::from_entropy();
    let deadline = Instant::now() + config.deadline;

    loop {
        if let Err(error) = socket.send_to(&payload, dest).await {
            tracing::warn!(%dest, %error, "repeater send failed");
        }

        if Instant::now() >= deadline {
            break;
        }

        let jitter = if config.interval_max.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(rng.gen_range(0.0..=config.interval_max.as_secs_f64()))
        };

        tokio::select! {
            _ = cancel.notified() => break,
            _ = tokio::time::sleep(jitter) => {}
        }

        if Instant::now() >= deadline {
            break;
        }
    }
}

use config::prelude::{MAX_IN_FLIGHT_LIMIT, QUEUE_DEPTH_LIMIT};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Transport;

/// Path appended to the configured collector URL for every envelope.
pub static UPDATE_PATH: &str = "/api/update";

/// Build the collector endpoint for a configured server URL.
pub fn endpoint(server_url: &str) -> String {
    let base = server_url.strip_suffix('/').unwrap_or(server_url);
    format!("{}{}", base, UPDATE_PATH)
}

#[derive(Debug)]
struct Delivery {
    url: String,
    body: Vec<u8>,
}

/*
 * DeliveryClient is the producers' handle on the outbound path.
 * Sending never blocks and never fails from the caller's point of view: a full or closed
 * queue drops the envelope with a warning. Delivery is at-most-once and best-effort.
 */
#[derive(Clone, Debug)]
pub struct DeliveryClient {
    tx: mpsc::Sender<Delivery>,
}

impl DeliveryClient {
    pub fn send(&self, server_url: &str, body: Vec<u8>) {
        let delivery = Delivery {
            url: endpoint(server_url),
            body,
        };
        match self.tx.try_send(delivery) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                log::warn!("delivery queue full, dropping envelope for {}", dropped.url);
            }
            Err(TrySendError::Closed(dropped)) => {
                log::warn!(
                    "delivery queue closed, dropping envelope for {}",
                    dropped.url
                );
            }
        }
    }
}

/*
 * Dispatcher owns the sending side of the pipeline: a bounded queue drained by a single task
 * that runs each POST on its own tokio task, at most `max_in_flight` at a time.
 */
pub struct Dispatcher {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl Dispatcher {
    pub fn spawn<T: Transport>(
        transport: T,
        queue_depth: usize,
        max_in_flight: usize,
        handle: &Handle,
    ) -> (DeliveryClient, Dispatcher) {
        let queue_depth = bounded("queue depth", queue_depth, QUEUE_DEPTH_LIMIT);
        let max_in_flight = bounded("max in-flight", max_in_flight, MAX_IN_FLIGHT_LIMIT);
        let (tx, rx) = mpsc::channel(queue_depth);
        let shutdown = CancellationToken::new();

        #[cfg(debug_assertions)]
        log::info!(
            "starting {} dispatcher (queue_depth={}, max_in_flight={})",
            transport.name(),
            queue_depth,
            max_in_flight
        );

        let task = handle.spawn(dispatch_loop(transport, rx, max_in_flight, shutdown.clone()));

        (DeliveryClient { tx }, Dispatcher { shutdown, task })
    }

    /// Stop accepting envelopes, deliver what is already queued and wait for in-flight sends.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(_err) = self.task.await {
            #[cfg(debug_assertions)]
            log::error!("dispatcher task failed: {_err}");
        }
    }
}

fn bounded(name: &str, value: usize, limit: usize) -> usize {
    let clamped = value.clamp(1, limit);
    if clamped != value {
        log::warn!("{} {} out of range, using {}", name, value, clamped);
    }
    clamped
}

async fn dispatch_loop<T: Transport>(
    transport: T,
    mut rx: mpsc::Receiver<Delivery>,
    max_in_flight: usize,
    shutdown: CancellationToken,
) {
    let permits = Arc::new(Semaphore::new(max_in_flight));
    let mut closing = false;

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled(), if !closing => {
                // Buffered envelopes are still received after close
                rx.close();
                closing = true;
                continue;
            }
            next = rx.recv() => next,
        };
        let Some(delivery) = next else {
            break;
        };

        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_err) => break,
        };
        let transport = transport.clone();
        tokio::spawn(async move {
            deliver(&transport, delivery).await;
            drop(permit);
        });
    }

    // Wait for in-flight sends to release their permits
    match u32::try_from(max_in_flight) {
        Ok(all) => {
            let _ = permits.acquire_many(all).await;
        }
        Err(_err) => {
            #[cfg(debug_assertions)]
            log::error!("cannot drain {} in-flight permits: {_err}", max_in_flight);
        }
    }

    #[cfg(debug_assertions)]
    log::info!("dispatcher drained");
}

async fn deliver<T: Transport>(transport: &T, delivery: Delivery) {
    let Delivery { url, body } = delivery;
    match transport.post(url.clone(), body).await {
        Ok(status) if (200..300).contains(&status) => {
            #[cfg(debug_assertions)]
            log::debug!("delivered envelope to {} ({})", url, status);
        }
        Ok(status) => {
            log::warn!("collector at {} answered {}, envelope discarded", url, status);
        }
        Err(err) => {
            log::warn!("delivery failed, envelope discarded: {:#}", err);
        }
    }
}

use config::{AgentConfig, MessageIdentity};
use envelope::{MessagePayload, Payload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use transport::DeliveryClient;

use crate::platform::{EventSink, MessageNotification, MessageSource, Subscription};

/*
 * MessageInterceptor turns every fragment of an inbound message notification into its own
 * `sms` envelope. Fragments are not reassembled. The handler runs on the platform's callback
 * thread and only encodes and enqueues; the POST happens on the dispatcher.
 */
pub struct MessageInterceptor {
    subscription: Option<Subscription>,
    sink: Arc<MessageSink>,
}

impl MessageInterceptor {
    /// `hardware_serial` is the platform identifier used when `identity` is `Hardware`.
    pub fn new(
        config: Arc<AgentConfig>,
        identity: MessageIdentity,
        hardware_serial: &str,
        delivery: DeliveryClient,
    ) -> Self {
        let device_id = match identity {
            MessageIdentity::Hardware => hardware_serial.to_string(),
            MessageIdentity::Configured => config.device_id().to_string(),
        };
        MessageInterceptor {
            subscription: None,
            sink: Arc::new(MessageSink {
                config,
                device_id,
                delivery,
                forwarded: AtomicU64::new(0),
            }),
        }
    }

    pub fn start(&mut self, source: &dyn MessageSource) {
        if self.subscription.is_some() {
            return;
        }
        let sink: Arc<dyn EventSink<MessageNotification>> = self.sink.clone();
        match source.subscribe(sink) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                #[cfg(debug_assertions)]
                log::info!("message interceptor registered");
            }
            Err(err) => {
                log::warn!("message source unavailable: {:#}", err);
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Identifier carried by this interceptor's envelopes.
    pub fn device_id(&self) -> &str {
        &self.sink.device_id
    }

    pub fn forwarded(&self) -> u64 {
        self.sink.forwarded.load(Ordering::Relaxed)
    }
}

impl Drop for MessageInterceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

struct MessageSink {
    config: Arc<AgentConfig>,
    device_id: String,
    delivery: DeliveryClient,
    forwarded: AtomicU64,
}

impl EventSink<MessageNotification> for MessageSink {
    fn on_event(&self, notification: MessageNotification) {
        #[cfg(debug_assertions)]
        log::debug!(
            "message notification with {} fragment(s), format={:?}",
            notification.fragments.len(),
            notification.format
        );

        for fragment in notification.fragments {
            let payload = Payload::from(MessagePayload::new(fragment.from, fragment.body));
            match envelope::encode(&self.device_id, &payload) {
                Ok(body) => {
                    self.delivery.send(self.config.server_url(), body);
                    self.forwarded.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    log::error!("failed to encode sms envelope: {:#}", err);
                }
            }
        }
    }
}

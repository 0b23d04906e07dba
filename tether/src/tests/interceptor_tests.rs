use super::{RecordingTransport, COLLECTOR, SERIAL};
use crate::interceptor::MessageInterceptor;
use crate::platform::local::LocalPlatform;
use crate::platform::{MessageFragment, MessageNotification};
use config::{AgentConfig, MessageIdentity};
use std::sync::Arc;
use tokio::runtime::Handle;
use transport::Dispatcher;

struct Harness {
    platform: LocalPlatform,
    interceptor: MessageInterceptor,
    dispatcher: Dispatcher,
    transport: RecordingTransport,
}

impl Harness {
    fn new(identity: MessageIdentity) -> Self {
        let platform = LocalPlatform::new();
        let transport = RecordingTransport::default();
        let (delivery, dispatcher) =
            Dispatcher::spawn(transport.clone(), 16, 2, &Handle::current());
        let config = Arc::new(AgentConfig::new("device_42", COLLECTOR).unwrap());

        let mut interceptor = MessageInterceptor::new(config, identity, SERIAL, delivery);
        interceptor.start(&platform);

        Harness {
            platform,
            interceptor,
            dispatcher,
            transport,
        }
    }

    /// Stop intercepting and wait until everything queued has been posted.
    async fn finish(self) -> RecordingTransport {
        drop(self.interceptor);
        self.dispatcher.shutdown().await;
        self.transport
    }
}

fn notification(fragments: Vec<MessageFragment>) -> MessageNotification {
    MessageNotification {
        format: Some("3gpp".to_string()),
        fragments,
    }
}

#[tokio::test]
async fn test_sms_envelope_uses_hardware_serial() {
    let harness = Harness::new(MessageIdentity::Hardware);
    assert!(harness.interceptor.is_active());
    assert_eq!(harness.interceptor.device_id(), SERIAL);

    harness.platform.deliver_message(notification(vec![MessageFragment::new(
        "+15551234567",
        "hello",
    )]));

    let transport = harness.finish().await;
    assert_eq!(
        transport.bodies(),
        vec![r#"{"deviceId":"R58M123ABC","type":"sms","payload":{"from":"+15551234567","text":"hello"}}"#.to_string()]
    );
    assert_eq!(
        transport.urls(),
        vec!["http://collector.example:4000/api/update".to_string()]
    );
}

#[tokio::test]
async fn test_configured_identity_uses_device_id() {
    let harness = Harness::new(MessageIdentity::Configured);
    assert_eq!(harness.interceptor.device_id(), "device_42");

    harness
        .platform
        .deliver_message(notification(vec![MessageFragment::new("+1", "hi")]));

    let transport = harness.finish().await;
    assert_eq!(transport.decoded()[0]["deviceId"], "device_42");
}

#[tokio::test]
async fn test_each_fragment_is_forwarded() {
    let harness = Harness::new(MessageIdentity::Hardware);

    harness.platform.deliver_message(notification(vec![
        MessageFragment::new("+15551234567", "part one "),
        MessageFragment::new("+15551234567", "part two "),
        MessageFragment::new("+15551234567", "part three"),
    ]));
    assert_eq!(harness.interceptor.forwarded(), 3);

    let transport = harness.finish().await;
    let mut texts: Vec<String> = transport
        .decoded()
        .iter()
        .map(|envelope| {
            assert_eq!(envelope["type"], "sms");
            envelope["payload"]["text"].as_str().unwrap().to_string()
        })
        .collect();
    texts.sort();
    assert_eq!(texts, vec!["part one ", "part three", "part two "]);
}

#[tokio::test]
async fn test_missing_fields_become_empty_strings() {
    let harness = Harness::new(MessageIdentity::Hardware);

    harness.platform.deliver_message(notification(vec![MessageFragment {
        from: None,
        body: None,
    }]));

    let transport = harness.finish().await;
    assert_eq!(
        transport.bodies(),
        vec![r#"{"deviceId":"R58M123ABC","type":"sms","payload":{"from":"","text":""}}"#.to_string()]
    );
}

#[tokio::test]
async fn test_empty_notification_posts_nothing() {
    let harness = Harness::new(MessageIdentity::Hardware);

    assert_eq!(harness.platform.deliver_message(MessageNotification::default()), 1);
    assert_eq!(harness.interceptor.forwarded(), 0);

    let transport = harness.finish().await;
    assert!(transport.bodies().is_empty());
}

#[tokio::test]
async fn test_stopped_interceptor_ignores_messages() {
    let mut harness = Harness::new(MessageIdentity::Hardware);

    harness.interceptor.stop();
    assert!(!harness.interceptor.is_active());
    assert_eq!(harness.platform.message_subscriptions(), 0);
    assert_eq!(
        harness
            .platform
            .deliver_message(notification(vec![MessageFragment::new("+1", "late")])),
        0
    );

    let transport = harness.finish().await;
    assert!(transport.bodies().is_empty());
}

use super::{fix, RecordingTransport, COLLECTOR};
use crate::platform::local::LocalPlatform;
use crate::platform::{
    EventSink, Location, LocationProvider, LocationRequest, LocationResult, Priority, Subscription,
};
use crate::sampler::{LocationSampler, SamplerState};
use anyhow::{anyhow, Result};
use config::AgentConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use transport::{Dispatcher, Transport, HTTP};

struct UnavailableProvider;

impl LocationProvider for UnavailableProvider {
    fn request_updates(
        &self,
        _request: LocationRequest,
        _sink: Arc<dyn EventSink<LocationResult>>,
    ) -> Result<Subscription> {
        Err(anyhow!("location services disabled"))
    }
}

fn request() -> LocationRequest {
    LocationRequest {
        interval: Duration::from_millis(5000),
        fastest_interval: Duration::from_millis(3000),
        priority: Priority::HighAccuracy,
    }
}

fn sampler_with<T: Transport>(transport: T, server_url: &str) -> (LocationSampler, Dispatcher) {
    let (delivery, dispatcher) = Dispatcher::spawn(transport, 16, 2, &Handle::current());
    let config = Arc::new(AgentConfig::new("device_42", server_url).unwrap());
    (LocationSampler::new(config, delivery, request()), dispatcher)
}

#[tokio::test]
async fn test_sampler_lifecycle() {
    let platform = LocalPlatform::new();
    let (mut sampler, dispatcher) = sampler_with(RecordingTransport::default(), COLLECTOR);
    assert_eq!(sampler.state(), SamplerState::Stopped);

    sampler.start(&platform);
    assert_eq!(sampler.state(), SamplerState::Active);
    assert_eq!(platform.location_requests(), vec![request()]);

    // Starting an active sampler does not subscribe again
    sampler.start(&platform);
    assert_eq!(platform.location_subscriptions(), 1);

    sampler.stop();
    assert_eq!(sampler.state(), SamplerState::Stopped);
    assert_eq!(platform.location_subscriptions(), 0);

    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_sampler_drop_unsubscribes() {
    let platform = LocalPlatform::new();
    let (mut sampler, dispatcher) = sampler_with(RecordingTransport::default(), COLLECTOR);

    sampler.start(&platform);
    drop(sampler);
    assert_eq!(platform.location_subscriptions(), 0);

    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_unavailable_provider_leaves_sampler_stopped() {
    let (mut sampler, dispatcher) = sampler_with(RecordingTransport::default(), COLLECTOR);

    sampler.start(&UnavailableProvider);
    assert_eq!(sampler.state(), SamplerState::Stopped);
    assert_eq!(sampler.forwarded(), 0);

    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_only_last_location_is_forwarded() {
    let platform = LocalPlatform::new();
    let transport = RecordingTransport::default();
    let (mut sampler, dispatcher) = sampler_with(transport.clone(), COLLECTOR);
    sampler.start(&platform);

    platform.deliver_location(LocationResult {
        locations: vec![
            Location::new(10.0, 10.0, 50.0, 1.0),
            Location::new(11.0, 11.0, 20.0, 2.0),
            Location::new(12.0, 12.0, 5.0, 3.0),
        ],
    });
    assert_eq!(sampler.forwarded(), 1);

    drop(sampler);
    dispatcher.shutdown().await;

    let sent = transport.decoded();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["payload"]["latitude"], 12.0);
    assert_eq!(sent[0]["payload"]["speed"], 3.0);
}

#[tokio::test]
async fn test_malformed_updates_are_skipped() {
    let platform = LocalPlatform::new();
    let transport = RecordingTransport::default();
    let (mut sampler, dispatcher) = sampler_with(transport.clone(), COLLECTOR);
    sampler.start(&platform);

    platform.deliver_location(LocationResult::default());
    platform.deliver_location(LocationResult::single(Location {
        latitude: Some(1.0),
        longitude: None,
        accuracy: Some(3.0),
        speed: None,
    }));
    platform.deliver_location(LocationResult::single(Location {
        latitude: Some(f64::NAN),
        longitude: Some(2.0),
        accuracy: None,
        speed: None,
    }));
    assert_eq!(sampler.skipped(), 3);
    assert_eq!(sampler.state(), SamplerState::Active);

    // The sampler keeps producing after bad updates
    platform.deliver_location(LocationResult::single(Location {
        latitude: Some(1.0),
        longitude: Some(2.0),
        accuracy: Some(-1.0),
        speed: None,
    }));
    assert_eq!(sampler.forwarded(), 1);

    drop(sampler);
    dispatcher.shutdown().await;

    assert_eq!(
        transport.bodies(),
        vec![r#"{"deviceId":"device_42","type":"location","payload":{"latitude":1.0,"longitude":2.0,"accuracy":null,"speed":null}}"#.to_string()]
    );
}

#[tokio::test]
async fn test_unreachable_collector_does_not_stop_sampling() {
    let platform = LocalPlatform::new();
    let transport = HTTP::new(None, Duration::from_secs(2)).unwrap();
    // Nothing listens on port 1
    let (mut sampler, dispatcher) = sampler_with(transport, "http://127.0.0.1:1");
    sampler.start(&platform);

    for i in 0..3 {
        platform.deliver_location(fix(37.0 + i as f64, -122.0, 5.0, 0.0));
    }

    dispatcher.shutdown().await;
    // The sampler outlives the failed deliveries
    platform.deliver_location(fix(40.0, -122.0, 5.0, 0.0));

    assert_eq!(sampler.state(), SamplerState::Active);
    assert_eq!(sampler.forwarded(), 4);
}

#[tokio::test]
async fn test_envelopes_carry_sampler_snapshot() {
    let platform = LocalPlatform::new();
    let transport = RecordingTransport::default();
    let (mut sampler, dispatcher) = sampler_with(transport.clone(), "http://collector.example:4000/");
    sampler.start(&platform);

    assert_eq!(sampler.config().device_id(), "device_42");
    platform.deliver_location(fix(37.0, -122.0, 5.0, 0.0));

    drop(sampler);
    dispatcher.shutdown().await;

    assert_eq!(
        transport.urls(),
        vec!["http://collector.example:4000/api/update".to_string()]
    );
    assert_eq!(transport.decoded()[0]["deviceId"], "device_42");
}

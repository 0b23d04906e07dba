use config::{AgentConfig, Settings, DEFAULT_SERVER_URL};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use transport::{DeliveryClient, Dispatcher, Transport};

use crate::interceptor::MessageInterceptor;
use crate::liveness::{Channel, LivenessIndicator, Notice};
use crate::platform::{LocationProvider, LocationRequest, MessageSource, Priority};
use crate::sampler::{LocationSampler, SamplerState};

/// Errors surfaced to whoever asked the agent to start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("invalid agent configuration: {0:#}")]
    InvalidConfig(anyhow::Error),
    #[error("failed to acquire liveness indicator: {0:#}")]
    Liveness(anyhow::Error),
    #[error("agent has been shut down")]
    ShutDown,
}

/// Platform facilities the agent runs against.
#[derive(Clone)]
pub struct Host {
    pub location: Arc<dyn LocationProvider>,
    pub messages: Arc<dyn MessageSource>,
    pub liveness: Arc<dyn LivenessIndicator>,
    /// Hardware serial, as reported by the platform.
    pub serial: String,
}

struct ActiveRun {
    config: Arc<AgentConfig>,
    sampler: LocationSampler,
    interceptor: MessageInterceptor,
}

/*
 * Supervisor is the single entry point for the boot hook and the control plane.
 * Each start builds a fresh config snapshot; producers from a previous start are torn down
 * before the new ones subscribe, so at most one sampler and one interceptor exist at a time.
 */
pub struct Supervisor {
    host: Host,
    settings: Settings,
    delivery: DeliveryClient,
    dispatcher: Mutex<Option<Dispatcher>>,
    active: Mutex<Option<ActiveRun>>,
}

impl Supervisor {
    pub fn new<T: Transport>(host: Host, transport: T, settings: Settings, handle: &Handle) -> Self {
        let (delivery, dispatcher) = Dispatcher::spawn(
            transport,
            settings.queue_depth,
            settings.max_in_flight,
            handle,
        );
        Supervisor {
            host,
            settings,
            delivery,
            dispatcher: Mutex::new(Some(dispatcher)),
            active: Mutex::new(None),
        }
    }

    /// Start with the boot-hook configuration: `device_<serial>` and the compiled-in collector.
    pub fn start_cold(&self) -> Result<(), StartError> {
        let device_id = AgentConfig::cold_start(&self.host.serial)
            .map_err(StartError::InvalidConfig)?
            .device_id()
            .to_string();
        self.start(&device_id, DEFAULT_SERVER_URL)
    }

    /*
     * Start (or restart) the agent. Returns as soon as the producers are subscribed; nothing here
     * waits on the network. A liveness failure leaves any previous run untouched.
     * Once `shutdown` has begun the delivery queue is closed for good and starting is refused.
     */
    pub fn start(&self, device_id: &str, server_url: &str) -> Result<(), StartError> {
        let config =
            Arc::new(AgentConfig::new(device_id, server_url).map_err(StartError::InvalidConfig)?);

        if self.is_shut_down() {
            return Err(StartError::ShutDown);
        }

        let mut active = self.active_run();
        if let Some(run) = active.as_ref() {
            if *run.config == *config && run.sampler.state() == SamplerState::Active {
                #[cfg(debug_assertions)]
                log::info!("agent already running with {:?}", config);
                return Ok(());
            }
        }

        self.host
            .liveness
            .register_channel(&Channel::default())
            .map_err(StartError::Liveness)?;
        self.host
            .liveness
            .show(&Notice::default())
            .map_err(StartError::Liveness)?;

        if let Some(mut previous) = active.take() {
            previous.sampler.stop();
            previous.interceptor.stop();
            log::info!("replacing configuration {:?}", previous.config);
        }

        let mut sampler =
            LocationSampler::new(config.clone(), self.delivery.clone(), self.location_request());
        sampler.start(self.host.location.as_ref());

        let mut interceptor = MessageInterceptor::new(
            config.clone(),
            self.settings.message_identity,
            &self.host.serial,
            self.delivery.clone(),
        );
        interceptor.start(self.host.messages.as_ref());

        log::info!("agent started with {:?}", config);
        *active = Some(ActiveRun {
            config,
            sampler,
            interceptor,
        });
        Ok(())
    }

    /// Tear down both producers and withdraw the liveness indicator.
    pub fn stop(&self) {
        let previous = self.active_run().take();
        if let Some(mut run) = previous {
            run.sampler.stop();
            run.interceptor.stop();
            self.host.liveness.withdraw(Notice::default().id);
            log::info!("agent stopped");
        }
    }

    /// Stop, then wait for queued and in-flight deliveries. Later events are dropped.
    pub async fn shutdown(&self) {
        // Taking the dispatcher first makes concurrent starts fail instead of feeding a closed queue
        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        self.stop();
        if let Some(dispatcher) = dispatcher {
            dispatcher.shutdown().await;
        }
    }

    pub fn config(&self) -> Option<Arc<AgentConfig>> {
        self.active_run().as_ref().map(|run| run.config.clone())
    }

    pub fn sampler_state(&self) -> SamplerState {
        self.active_run()
            .as_ref()
            .map(|run| run.sampler.state())
            .unwrap_or(SamplerState::Stopped)
    }

    pub fn location_events_forwarded(&self) -> u64 {
        self.active_run()
            .as_ref()
            .map(|run| run.sampler.forwarded())
            .unwrap_or(0)
    }

    pub fn message_events_forwarded(&self) -> u64 {
        self.active_run()
            .as_ref()
            .map(|run| run.interceptor.forwarded())
            .unwrap_or(0)
    }

    fn location_request(&self) -> LocationRequest {
        LocationRequest {
            interval: self.settings.location_interval,
            fastest_interval: self.settings.location_fastest_interval,
            priority: Priority::HighAccuracy,
        }
    }

    fn is_shut_down(&self) -> bool {
        self.dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    fn active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

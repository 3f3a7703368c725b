use std::time::Duration;

use gsm_config::{CfgPhyIo, PhyBackend, SharedConfig, StackConfig, StackMode, StackState};
use gsm_core::gsm_entities::GsmEntity;
use gsm_entities::l1::l1_ms::L1Ms;
use gsm_entities::l1s::L1Sync;
use gsm_entities::lapdm::Lapdm;
use gsm_entities::phy::PhyIf;
use gsm_entities::{GsmEntityTrait, MessageRouter};
use gsm_saps::SapMsg;

use super::sink::Sink;

/// Creates a default config for testing. It can still be modified as needed
/// before passing it to the ComponentTest constructor
pub fn default_test_config(stack_mode: StackMode) -> StackConfig {
    let mut config = StackConfig::new(stack_mode);

    // The tests drive L1Sync frame by frame themselves
    config.phy_io = CfgPhyIo { backend: PhyBackend::None, ..Default::default() };
    config
}

/// Infrastructure for testing stack components
/// Quick setup of the main loop entities with a manually advanced clock
/// Supports optional sinks for collecting messages for later inspection
pub struct ComponentTest {
    pub config: SharedConfig,
    pub router: MessageRouter,
    pub sinks: Vec<GsmEntity>,
    now: Duration,
}

impl ComponentTest {
    pub fn new(config: StackConfig) -> Self {
        let shared_config = SharedConfig::from_parts(config, StackState::default());
        let router = MessageRouter::new(shared_config.clone());

        Self { config: shared_config, router, sinks: vec![], now: Duration::ZERO }
    }

    pub fn get_shared_config(&self) -> SharedConfig {
        self.config.clone()
    }

    /// Registers the requested main loop entities and sinks.
    /// L1 needs a PHY and is attached separately with `attach_l1`.
    pub fn populate_entities(&mut self, components: Vec<GsmEntity>, sinks: Vec<GsmEntity>) {
        for component in components.iter() {
            match component {
                GsmEntity::Lapdm => {
                    let lapdm = Lapdm::new(self.config.clone());
                    self.register_entity(lapdm);
                }
                _ => {
                    panic!("Component not implemented: {:?}", component);
                }
            }
        }

        self.create_sinks(sinks);
    }

    /// Creates the tick-context L1 on `phy` and registers its main loop front.
    /// The caller drives the returned L1Sync with frame ticks.
    pub fn attach_l1(&mut self, phy: Box<dyn PhyIf>) -> L1Sync {
        let (l1s, link) = L1Sync::new(&self.config, phy);
        let l1 = L1Ms::new(self.config.clone(), link);
        self.register_entity(l1);
        l1s
    }

    fn create_sinks(&mut self, sinks: Vec<GsmEntity>) {
        for sink in sinks.iter() {
            assert!(!self.sinks.contains(sink), "Sink already exists: {:?}", sink);
            assert!(self.router.get_entity(*sink).is_none(), "Sink already registered as entity: {:?}", sink);

            self.sinks.push(*sink);
            let sink = Sink::new(*sink);
            self.router.register_entity(Box::new(sink));
        }
    }

    pub fn register_entity<T: 'static + GsmEntityTrait>(&mut self, entity: T) {
        self.router.register_entity(Box::new(entity));
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        self.router.submit_message(message);
    }

    pub fn deliver_all_messages(&mut self) {
        self.router.deliver_all_messages();
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Runs one main loop iteration at the current time
    pub fn tick(&mut self) {
        self.router.tick(self.now);
    }

    /// Advances the main loop clock by `delta` and runs one iteration
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
        self.router.tick(self.now);
    }

    /// Takes the messages collected by all sinks, in sink registration order
    pub fn dump_sinks(&mut self) -> Vec<SapMsg> {
        let mut msgs = vec![];
        for sink in self.sinks.iter() {
            if let Some(component) = self.router.get_entity(*sink) {
                if let Some(sink) = component.as_any_mut().downcast_mut::<Sink>() {
                    let mut sink_msgs = sink.take_msgqueue();
                    msgs.append(&mut sink_msgs);
                }
            }
        }
        msgs
    }

    /// Takes the messages collected by one sink
    pub fn dump_sink(&mut self, entity: GsmEntity) -> Vec<SapMsg> {
        self.router
            .get_entity(entity)
            .and_then(|component| component.as_any_mut().downcast_mut::<Sink>())
            .map(|sink| sink.take_msgqueue())
            .unwrap_or_default()
    }
}

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use gsm_config::SharedConfig;
use gsm_core::gsm_entities::GsmEntity;
use gsm_saps::SapMsg;

use crate::GsmEntityTrait;

/// Sleep between two main loop iterations when nothing is pending
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Default)]
pub enum MessagePrio {
    Immediate,
    #[default]
    Normal,
}

#[derive(Default)]
pub struct MessageQueue {
    messages: VecDeque<SapMsg>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self { messages: VecDeque::new() }
    }

    pub fn push_back(&mut self, message: SapMsg) {
        self.messages.push_back(message);
    }

    pub fn push_prio(&mut self, message: SapMsg, prio: MessagePrio) {
        match prio {
            MessagePrio::Immediate => {
                // Insert at the front for immediate processing
                self.messages.push_front(message);
            }
            MessagePrio::Normal => {
                self.messages.push_back(message);
            }
        }
    }

    pub fn pop_front(&mut self) -> Option<SapMsg> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Cooperative, single threaded main loop. Delivers one primitive at a time to its destination entity.
pub struct MessageRouter {
    /// While currently unused by the MessageRouter, this may change in the future
    /// As such, we provide the MessageRouter with a copy of the SharedConfig
    _config: SharedConfig,
    entities: HashMap<GsmEntity, Box<dyn GsmEntityTrait>>,
    msg_queue: MessageQueue,
}

impl MessageRouter {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            entities: HashMap::new(),
            msg_queue: MessageQueue::new(),
            _config: config,
        }
    }

    pub fn register_entity(&mut self, entity: Box<dyn GsmEntityTrait>) {
        let comp_type = entity.entity();
        tracing::debug!("register_entity {:?}", comp_type);
        self.entities.insert(comp_type, entity);
    }

    /// Returns a mut ref to a component of the requested type
    pub fn get_entity(&mut self, comp: GsmEntity) -> Option<&mut dyn GsmEntityTrait> {
        self.entities.get_mut(&comp).map(|entity| entity.as_mut())
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        tracing::debug!("submit_message {}: {:?} -> {:?}", message.msg, message.get_source(), message.get_dest());
        self.msg_queue.push_back(message);
    }

    pub fn deliver_message(&mut self) {
        let Some(message) = self.msg_queue.pop_front() else {
            return;
        };
        tracing::debug!("deliver_message: got {}: {:?} -> {:?}", message.msg, message.get_source(), message.get_dest());

        // Check if the destination entity registered and deliver if found
        let dest = *message.get_dest();
        if let Some(entity) = self.entities.get_mut(&dest) {
            entity.rx_prim(&mut self.msg_queue, message);
        } else {
            tracing::warn!("deliver_message: entity {:?} not found for {}: {:?} -> {:?}", dest, message.msg, message.get_source(), dest);
        }
    }

    pub fn deliver_all_messages(&mut self) {
        while !self.msg_queue.is_empty() {
            self.deliver_message();
        }
    }

    pub fn get_msgqueue_len(&self) -> usize {
        self.msg_queue.len()
    }

    pub fn tick_start(&mut self, now: Duration) {
        tracing::trace!("--- tick {:?} ----------------------------", now);
        for entity in self.entities.values_mut() {
            entity.tick_start(&mut self.msg_queue, now);
        }
    }

    /// Executes all end-of-iteration functions. Returns true if any entity has work pending.
    pub fn tick_end(&mut self, now: Duration) -> bool {
        let mut busy = false;
        for entity in self.entities.values_mut() {
            busy |= entity.tick_end(&mut self.msg_queue, now);
        }
        self.deliver_all_messages();
        busy
    }

    /// One full main loop iteration at time `now`
    pub fn tick(&mut self, now: Duration) -> bool {
        self.tick_start(now);
        self.deliver_all_messages();
        self.tick_end(now)
    }

    /// Runs the full stack against the system clock, either until `running` is cleared
    /// or for a specified number of iterations.
    pub fn run_stack(&mut self, num_ticks: Option<usize>, running: Option<Arc<AtomicBool>>) {
        let start = Instant::now();
        let mut ticks: usize = 0;

        loop {
            let busy = self.tick(start.elapsed());

            ticks += 1;
            if let Some(num_ticks) = num_ticks {
                if ticks >= num_ticks {
                    break;
                }
            }
            if let Some(running) = &running {
                if !running.load(Ordering::Relaxed) {
                    tracing::info!("run_stack: stop requested after {} iterations", ticks);
                    break;
                }
            }
            if !busy {
                std::thread::sleep(IDLE_SLEEP);
            }
        }
    }
}

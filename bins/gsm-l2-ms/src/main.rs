use clap::Parser;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use gsm_config::{PhyBackend, SharedConfig, StackMode, toml_config};
use gsm_core::debug;
use gsm_core::gsm_entities::GsmEntity;
use gsm_entities::MessageRouter;
use gsm_entities::l1::l1_ms::L1Ms;
use gsm_entities::l1s::L1Sync;
use gsm_entities::lapdm::Lapdm;
use gsm_entities::phy::NullPhy;
use gsm_entities::phy::virt_phy::{VirtPhy, VirtPhyDriver};

mod l3_monitor;

use l3_monitor::L3Monitor;

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            println!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

/// Owner of the tick context while the main loop runs
enum TickContext {
    /// Driven by the virtual PHY thread
    Thread(JoinHandle<()>),
    /// No PHY delivers frames, L1Sync stays idle
    Idle(L1Sync),
}

/// Starts the tick context on the configured PHY. Returns the main loop front of L1.
fn start_phy(cfg: &SharedConfig, running: &Arc<AtomicBool>) -> (L1Ms, TickContext) {
    match cfg.config().phy_io.backend {
        PhyBackend::Virtual => {
            let (l1s, link) = L1Sync::new(cfg, Box::new(VirtPhy::new()));
            let driver = VirtPhyDriver::new(cfg, l1s);
            let handle = match driver.spawn(running.clone()) {
                Ok(handle) => handle,
                Err(e) => {
                    println!("Failed to start virtual PHY: {}", e);
                    std::process::exit(1);
                }
            };
            (L1Ms::new(cfg.clone(), link), TickContext::Thread(handle))
        }
        PhyBackend::None => {
            // The clock supervision will report the missing frames
            let (l1s, link) = L1Sync::new(cfg, Box::new(NullPhy));
            (L1Ms::new(cfg.clone(), link), TickContext::Idle(l1s))
        }
        PhyBackend::Undefined => {
            println!("No PHY backend configured");
            std::process::exit(1);
        }
    }
}

/// Builds the layer 1/2 stack with logging stand-ins for the layer 3 entities
fn build_stack(cfg: &SharedConfig, l1: L1Ms) -> MessageRouter {
    let mut router = MessageRouter::new(cfg.clone());
    router.register_entity(Box::new(l1));
    router.register_entity(Box::new(Lapdm::new(cfg.clone())));
    router.register_entity(Box::new(L3Monitor::new(GsmEntity::Rr)));
    if cfg.config().lapdm.sapi3_enabled {
        router.register_entity(Box::new(L3Monitor::new(GsmEntity::Sms)));
    }
    router
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "GSM MS layer 1/2 stack",
    long_about = "Runs the TDMA scheduler and LAPDm of a GSM mobile station using the provided TOML configuration file"
)]
struct Args {
    /// Config file (required)
    #[arg(help = "TOML config with PHY, L1 and LAPDm parameters")]
    config: String,
}

fn main() {
    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    match cfg.config().stack_mode {
        StackMode::Ms => {}
        StackMode::Bts => {
            tracing::warn!("BTS mode only serves loopback tests, running LAPDm as network side");
        }
    }

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let (l1, tick_context) = start_phy(&cfg, &running);
    let mut router = build_stack(&cfg, l1);
    router.run_stack(None, Some(running));

    match tick_context {
        TickContext::Thread(handle) => {
            if handle.join().is_err() {
                tracing::error!("virtual PHY thread panicked");
            }
        }
        TickContext::Idle(l1s) => {
            tracing::info!("stopped, frame clock {:?}", l1s.clock().state());
        }
    }
}

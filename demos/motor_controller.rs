//! Motor controller example
//!
//! Runs the motor controller state machine against real (tokio) timers and a
//! logging output device, pressing buttons on a script:
//! - Reset, then wait for the motor to run down
//! - Toggle direction and start the motor
//! - Hit the emergency stop part way through, then release it
//!
//! Set `RUST_LOG=hfsm_dispatch=debug` to watch every transition and output.
//! The PlantUML diagram of the transitions taken is printed at the end.

use std::time::Duration;

use hfsm_dispatch::motor::driver::OutputLog;
use hfsm_dispatch::motor::events::{self, payload, REM1_DIR, SM_RESET, SW_ESTOP, SW_RUN};
use hfsm_dispatch::motor::regs::Registers;
use hfsm_dispatch::motor::{self, MotorContext, StateChangePublisher};
use hfsm_dispatch::{Event, EventCatalog, EventQueue, Runner, TokioTimerService};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const REGISTERS: &str = r#"{
    "motor_soft_start_duration": 500,
    "motor_run_down_duration": 300
}"#;

async fn simulate_motor() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎯 Starting motor simulation...\n");

    let catalog = EventCatalog::parse(events::DEFINITIONS)?;
    let trace = catalog
        .trace_mask("switch")
        .ok_or("no switch events defined")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let queue = EventQueue::new();
    let outputs = OutputLog::new();
    let context = MotorContext::new(
        Registers::from_json(REGISTERS)?,
        TokioTimerService::new(event_tx.clone()),
        outputs.clone(),
        queue.clone(),
    );
    let machine = motor::builder(context)
        .observer(StateChangePublisher::new(queue.clone()))
        .build()?;
    let mut runner = Runner::new(machine, queue).with_trace(catalog, trace);

    let script = vec![
        (Event::new(SM_RESET), Duration::from_millis(500), "Resetting"),
        (Event::with_payload(REM1_DIR, payload::SW_CLICK), Duration::from_millis(50), "Reversing direction"),
        (Event::with_payload(SW_RUN, payload::SW_CLICK), Duration::from_millis(1200), "Starting motor"),
        (Event::with_payload(SW_ESTOP, payload::SW_CLICK), Duration::from_millis(100), "Emergency stop!"),
        (Event::with_payload(SW_ESTOP, payload::SW_RELEASE), Duration::from_millis(500), "Releasing emergency stop"),
    ];

    for (event, settle, description) in script {
        println!("📋 {}", description);
        event_tx.send(event)?;

        // Timers keep the channel open, so drive the machine for a while
        let _ = tokio::time::timeout(settle, runner.run(&mut event_rx)).await;

        let machine = runner.machine();
        println!("📊 State: {:?}", machine.current_state());
        println!("🔌 Relays: {:#06b}", outputs.relays());
        for command in outputs.drain() {
            println!("💡 {:?}", command);
        }
        println!();
    }

    println!("{}", runner.machine().export_plantuml());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,hfsm_dispatch=info")),
        )
        .init();

    match simulate_motor().await {
        Ok(()) => println!("Motor simulation completed successfully!"),
        Err(e) => println!("Error during motor simulation: {:?}", e),
    }

    Ok(())
}

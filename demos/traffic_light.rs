//! Traffic Light State Machine
//!
//! This example demonstrates a cyclic state machine driven entirely by
//! timeout events.
//!
//! Key concepts:
//! - Timeout events fire while a state stays active
//! - An external event pre-empts the pending timeout
//! - Transition history records what triggered each change
//!
//! Run with: cargo run --example traffic_light

use std::thread;
use std::time::Duration;
use tantamount::core::HookState;
use tantamount::engine::Transition;
use tantamount::{id_enum, MachineBuilder, MachineConfig};

id_enum! {
    enum Light {
        Red,
        Yellow,
        Green,
    }
}

id_enum! {
    enum Signal {
        Next,
        Emergency,
    }
}

fn lamp(light: Light) -> HookState<Signal> {
    HookState::new().entry(move || {
        println!("  {light} on");
        Ok(None)
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Traffic Light State Machine ===\n");

    let machine = MachineBuilder::new()
        .with_config(MachineConfig::named("crossing"))
        .add_state(Light::Red, lamp(Light::Red))
        .add_state(Light::Green, lamp(Light::Green))
        .add_state(Light::Yellow, lamp(Light::Yellow))
        .set_start_state(Light::Red)?
        .add_transition(Light::Red, Signal::Next, Light::Green)?
        .add_transition(Light::Green, Signal::Next, Light::Yellow)?
        .add_transition(Light::Yellow, Signal::Next, Light::Red)?
        .add_transition_with(
            Light::Green,
            Signal::Emergency,
            Transition::to(Light::Red).action(|| {
                println!("  emergency vehicle approaching");
                Ok(())
            }),
        )?
        .add_timeout_event(Light::Red, Signal::Next, 0.3)?
        .add_timeout_event(Light::Green, Signal::Next, 0.3)?
        .add_timeout_event(Light::Yellow, Signal::Next, 0.1)?
        .build()?;

    println!("Cycling on timeouts:");
    machine.start()?;
    thread::sleep(Duration::from_millis(1000));

    println!("\nEmergency while green:");
    while machine.active_state_id() != Light::Green {
        thread::sleep(Duration::from_millis(10));
    }
    if let Err(err) = machine.operate(Signal::Emergency) {
        // The green timeout won the race for the dispatch lock.
        println!("  missed the green light: {err}");
    }

    thread::sleep(Duration::from_millis(100));
    machine.stop();

    println!("\nHistory:");
    for transition in machine.history().transitions() {
        println!(
            "  {} -> {} on {} ({:?})",
            transition.from, transition.to, transition.event, transition.trigger
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

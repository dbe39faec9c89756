//! Text console for the panel
//!
//! Each input line is one command; each reply is one JSON object.

use crate::engine::{AlarmDecisionEngine, CameraImage, SharedEngine};
use crate::repository::{ArmingStatus, Sensor, SensorType};
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

/// Reply to a single command line
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub response: Value,
    pub quit: bool,
}

impl CommandOutcome {
    fn reply(response: Value) -> Self {
        Self {
            response,
            quit: false,
        }
    }

    fn error(message: impl std::fmt::Display) -> Self {
        Self::reply(json!({"type": "error", "message": message.to_string()}))
    }
}

/// Line-oriented command processor bound to one engine
pub struct Console {
    engine: SharedEngine,
}

impl Console {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    pub fn welcome(&self) -> Value {
        json!({
            "type": "welcome",
            "message": format!("Catpoint Panel v{}", env!("CARGO_PKG_VERSION")),
            "commands": ["help", "status", "add", "remove", "activate", "deactivate", "arm", "disarm", "image", "quit"]
        })
    }

    /// Process one console command
    pub fn process_command(&self, command: &str) -> CommandOutcome {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let cmd = parts.first().map(|s| s.to_lowercase()).unwrap_or_default();
        let args = parts.get(1..).unwrap_or_default();
        debug!(command = cmd.as_str(), "Console command");

        match cmd.as_str() {
            "" => CommandOutcome::reply(json!({"type": "noop"})),
            "help" => CommandOutcome::reply(help()),
            "quit" | "exit" => CommandOutcome {
                response: json!({"type": "bye"}),
                quit: true,
            },
            _ => {
                let mut engine = match self.engine.lock() {
                    Ok(engine) => engine,
                    Err(_) => return CommandOutcome::error("engine lock poisoned"),
                };
                match execute(&mut engine, cmd.as_str(), args) {
                    Ok(response) => CommandOutcome::reply(response),
                    Err(message) => CommandOutcome::error(message),
                }
            }
        }
    }
}

fn help() -> Value {
    json!({
        "type": "help",
        "commands": {
            "help": "Show this help message",
            "status": "Show alarm, arming and sensor state",
            "add <door|window|motion> <name>": "Add a sensor",
            "remove <id>": "Remove a sensor",
            "activate <id>": "Activate a sensor",
            "deactivate <id>": "Deactivate a sensor",
            "arm <home|away>": "Arm the system",
            "disarm": "Disarm the system",
            "image <path>": "Scan a camera frame for cats",
            "quit": "End the session"
        }
    })
}

fn execute(engine: &mut AlarmDecisionEngine, cmd: &str, args: &[&str]) -> Result<Value, String> {
    match cmd {
        "status" => status(engine),
        "add" => {
            let (kind, name) = args
                .split_first()
                .ok_or("usage: add <door|window|motion> <name>")?;
            let sensor_type: SensorType = kind.parse().map_err(|e| format!("{}", e))?;
            if name.is_empty() {
                return Err("sensor name is required".to_string());
            }
            let sensor = Sensor::new(name.join(" "), sensor_type);
            let reply = json!({"type": "added", "sensor": sensor});
            engine.add_sensor(sensor).map_err(|e| e.to_string())?;
            Ok(reply)
        }
        "remove" => {
            let sensor = find_sensor(engine, args)?;
            engine.remove_sensor(&sensor).map_err(|e| e.to_string())?;
            Ok(json!({"type": "removed", "id": sensor.id()}))
        }
        "activate" | "deactivate" => {
            let sensor = find_sensor(engine, args)?;
            engine
                .change_sensor_activation(&sensor, cmd == "activate")
                .map_err(|e| e.to_string())?;
            status(engine)
        }
        "arm" => {
            let arming = match args.first().map(|s| s.to_lowercase()).as_deref() {
                Some("home") => ArmingStatus::ArmedHome,
                Some("away") => ArmingStatus::ArmedAway,
                _ => return Err("usage: arm <home|away>".to_string()),
            };
            engine.set_arming_status(arming).map_err(|e| e.to_string())?;
            status(engine)
        }
        "disarm" => {
            engine
                .set_arming_status(ArmingStatus::Disarmed)
                .map_err(|e| e.to_string())?;
            status(engine)
        }
        "image" => {
            if args.is_empty() {
                return Err("usage: image <path>".to_string());
            }
            let path = args.join(" ");
            let image = CameraImage::from_file(Path::new(&path)).map_err(|e| e.to_string())?;
            let cat = engine.process_image(&image).map_err(|e| e.to_string())?;
            let mut reply = status(engine)?;
            reply["cat_detected"] = json!(cat);
            Ok(reply)
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn status(engine: &AlarmDecisionEngine) -> Result<Value, String> {
    let alarm = engine.alarm_status().map_err(|e| e.to_string())?;
    let arming = engine.arming_status().map_err(|e| e.to_string())?;
    let sensors = engine.sensors().map_err(|e| e.to_string())?;

    Ok(json!({
        "type": "status",
        "alarm": alarm,
        "alarm_message": alarm.description(),
        "arming": arming,
        "arming_message": arming.description(),
        "cat_detected": engine.cat_detected(),
        "sensors": sensors,
    }))
}

/// Resolve a full id or a unique id prefix
fn find_sensor(engine: &AlarmDecisionEngine, args: &[&str]) -> Result<Sensor, String> {
    let needle = args.first().ok_or("a sensor id is required")?.to_lowercase();
    let mut matches: Vec<Sensor> = engine
        .sensors()
        .map_err(|e| e.to_string())?
        .into_iter()
        .filter(|s| s.id().to_string().starts_with(&needle))
        .collect();

    match matches.len() {
        0 => Err(format!("No sensor matches {}", needle)),
        1 => Ok(matches.remove(0)),
        n => Err(format!("{} sensors match {}, use a longer id", n, needle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeuristicCatClassifier;
    use crate::repository::InMemoryRepository;
    use std::io::Write;
    use std::sync::Arc;

    fn console() -> Console {
        let engine = AlarmDecisionEngine::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(HeuristicCatClassifier::new()),
        );
        Console::new(engine.into_shared())
    }

    fn add(console: &Console, line: &str) -> String {
        let outcome = console.process_command(line);
        assert_eq!(outcome.response["type"], "added", "{}", outcome.response);
        outcome.response["sensor"]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_add_arm_and_activate() {
        let console = console();
        let id = add(&console, "add door Front Door");

        let armed = console.process_command("arm away").response;
        assert_eq!(armed["arming"], "ARMED_AWAY");

        let activated = console.process_command(&format!("activate {}", &id[..8])).response;
        assert_eq!(activated["alarm"], "PENDING_ALARM");
        assert_eq!(activated["sensors"][0]["name"], "Front Door");
        assert_eq!(activated["sensors"][0]["active"], true);

        let deactivated = console.process_command(&format!("deactivate {}", id)).response;
        assert_eq!(deactivated["alarm"], "NO_ALARM");
    }

    #[test]
    fn test_disarm_and_remove() {
        let console = console();
        let id = add(&console, "add window Kitchen");
        console.process_command("arm home");
        console.process_command(&format!("activate {}", id));

        let disarmed = console.process_command("disarm").response;
        assert_eq!(disarmed["alarm"], "NO_ALARM");
        assert_eq!(disarmed["sensors"][0]["active"], false);

        let removed = console.process_command(&format!("remove {}", id)).response;
        assert_eq!(removed["type"], "removed");
        let status = console.process_command("status").response;
        assert_eq!(status["sensors"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_image_command() {
        let console = console();
        console.process_command("arm home");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..2048).map(|i| (i % 256) as u8).collect();
        file.write_all(&data).unwrap();

        let reply = console
            .process_command(&format!("image {}", file.path().display()))
            .response;
        assert_eq!(reply["cat_detected"], true);
        assert_eq!(reply["alarm"], "ALARM");
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let console = console();
        for line in ["bogus", "add cat Tom", "add door", "activate", "activate 123", "arm", "image"] {
            let outcome = console.process_command(line);
            assert_eq!(outcome.response["type"], "error", "{}", line);
            assert!(!outcome.quit);
        }
    }

    #[test]
    fn test_capacity_error() {
        let console = console();
        for i in 0..4 {
            add(&console, &format!("add motion Sensor {}", i));
        }
        let outcome = console.process_command("add motion Overflow");
        assert_eq!(outcome.response["type"], "error");
    }

    #[test]
    fn test_quit_and_help() {
        let console = console();
        assert!(console.process_command("quit").quit);
        assert!(console.process_command("EXIT").quit);
        assert_eq!(console.process_command("help").response["type"], "help");
        assert_eq!(console.process_command("   ").response["type"], "noop");
        assert_eq!(console.welcome()["type"], "welcome");
    }
}

//! Integration tests for the opencabin-skills crate.
//!
//! These tests exercise the loader, registry, executor, and orchestrator as
//! integrated subsystems over real on-disk package fixtures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use opencabin_core::{Command, DomainRouting, DomainType, RecognizedIntent, SkillContext};
use opencabin_skills::{
    CapabilityHandler, Disposition, ExecutionOutcome, ExecutionRequest, FileBasedSkillOrchestrator,
    FileBasedSkillRegistry, SkillError, SkillExecutor, global_registry, reset_global_registry,
};

// ═══════════════════════════════════════════════════════════════════════
//  Fixtures
// ═══════════════════════════════════════════════════════════════════════

const WIPER_YAML: &str = concat!(
    "name: wiper_ctl\n",
    "domain: vehicle_control\n",
    "version: 1.0.0\n",
    "summary: Windshield wiper control\n",
    "capabilities:\n",
    "  - name: set_speed\n",
    "    short_description: Change wiper sweep speed\n",
);

const WIPER_SCHEMA: &str = r#"{
    "capabilities": [
        {
            "name": "set_speed",
            "slots": [
                {
                    "name": "speed",
                    "type": "enum",
                    "required": true,
                    "enum_values": ["low", "medium", "high"]
                }
            ]
        }
    ]
}"#;

fn write_wiper_package(root: &Path) {
    let dir = root.join("wiper_ctl");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("skill.yaml"), WIPER_YAML).unwrap();
    std::fs::write(dir.join("SKILL.md"), "# Wiper control\n\nAdjust wiper speed.").unwrap();
    std::fs::write(dir.join("capabilities.json"), WIPER_SCHEMA).unwrap();
}

/// Echoes the `speed` slot into a command, counting invocations.
struct EchoSpeed {
    calls: AtomicUsize,
}

impl EchoSpeed {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CapabilityHandler for EchoSpeed {
    async fn handle(
        &self,
        slots: &HashMap<String, Value>,
        _context: &SkillContext,
    ) -> anyhow::Result<ExecutionOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let speed = slots.get("speed").cloned().unwrap_or(Value::Null);
        Ok(ExecutionOutcome::empty()
            .with_command(
                Command::new("set_wiper_speed", DomainType::VehicleControl)
                    .with_param("speed", speed),
            )
            .with_tts("wipers adjusted"))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  End-to-end execution
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn wiper_package_executes_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_wiper_package(tmp.path());

    let registry = Arc::new(FileBasedSkillRegistry::new());
    registry.load(tmp.path()).await.unwrap();

    let executor = Arc::new(SkillExecutor::new());
    let handler = EchoSpeed::new();
    executor.register_handler("set_speed", handler.clone());

    let orchestrator = FileBasedSkillOrchestrator::new(registry, executor);

    let routing = DomainRouting::new(DomainType::VehicleControl, "wipers to high", 0.95)
        .with_intent(RecognizedIntent::new("set_speed", 0.95).with_slot("speed", "high"));

    let result = orchestrator
        .handle(&routing, &SkillContext::default())
        .await
        .unwrap();

    assert_eq!(result.disposition, Disposition::Executed);
    assert_eq!(result.commands.len(), 1);
    assert_eq!(result.commands[0].kind, "set_wiper_speed");
    assert_eq!(result.commands[0].params["speed"], "high");
    assert_eq!(result.commands[0].domain, DomainType::VehicleControl);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_enum_value_produces_zero_commands() {
    let tmp = tempfile::tempdir().unwrap();
    write_wiper_package(tmp.path());

    let registry = Arc::new(FileBasedSkillRegistry::new());
    registry.load(tmp.path()).await.unwrap();

    let executor = Arc::new(SkillExecutor::new());
    let handler = EchoSpeed::new();
    executor.register_handler("set_speed", handler.clone());

    // At the executor boundary the violation is a typed error...
    let request = ExecutionRequest {
        capability_name: "set_speed".to_owned(),
        raw_slots: HashMap::from([("speed".to_owned(), json!("turbo"))]),
        context: SkillContext::default(),
    };
    let direct = executor.execute(&registry, &request).await;
    assert!(matches!(direct, Err(SkillError::SlotValidation { .. })));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

    // ...and at the orchestrator boundary it is absorbed into an apology.
    let orchestrator = FileBasedSkillOrchestrator::new(registry, executor);
    let routing = DomainRouting::new(DomainType::VehicleControl, "wipers to turbo", 0.95)
        .with_intent(RecognizedIntent::new("set_speed", 0.95).with_slot("speed", "turbo"));

    let result = orchestrator
        .handle(&routing, &SkillContext::default())
        .await
        .unwrap();

    assert_eq!(result.disposition, Disposition::HandlerFailed);
    assert!(result.commands.is_empty());
    assert!(!result.tts_text.is_empty());
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn confidence_gate_rejects_before_any_lookup() {
    let tmp = tempfile::tempdir().unwrap();
    write_wiper_package(tmp.path());

    let registry = Arc::new(FileBasedSkillRegistry::new());
    registry.load(tmp.path()).await.unwrap();
    let executor = Arc::new(SkillExecutor::new());
    executor.register_handler("set_speed", EchoSpeed::new());

    let orchestrator = FileBasedSkillOrchestrator::new(registry, executor);

    for confidence in [0.0, 0.1, 0.29] {
        let routing = DomainRouting::new(DomainType::VehicleControl, "mumble", confidence)
            .with_intent(RecognizedIntent::new("set_speed", confidence).with_slot("speed", "high"));

        let result = orchestrator
            .handle(&routing, &SkillContext::default())
            .await
            .unwrap();

        assert_eq!(result.disposition, Disposition::LowConfidence);
        assert!(result.commands.is_empty());
        assert!(!result.tts_text.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Registry lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn domain_listing_matches_package_domains() {
    let tmp = tempfile::tempdir().unwrap();
    write_wiper_package(tmp.path());

    let radio = tmp.path().join("radio");
    std::fs::create_dir_all(&radio).unwrap();
    std::fs::write(radio.join("skill.yaml"), "name: radio\ndomain: music\n").unwrap();

    let registry = FileBasedSkillRegistry::new();
    registry.load(tmp.path()).await.unwrap();

    let vehicle = registry.find_by_domain(DomainType::VehicleControl);
    assert_eq!(vehicle.len(), 1);
    assert_eq!(vehicle[0].name, "wiper_ctl");
    assert_eq!(vehicle[0].version, "1.0.0");

    let music = registry.find_by_domain(DomainType::Music);
    assert_eq!(music.len(), 1);
    assert_eq!(music[0].name, "radio");
}

#[tokio::test]
async fn reload_swaps_the_snapshot_wholesale() {
    let first_root = tempfile::tempdir().unwrap();
    write_wiper_package(first_root.path());

    let second_root = tempfile::tempdir().unwrap();
    let seat = second_root.path().join("seat_ctl");
    std::fs::create_dir_all(&seat).unwrap();
    std::fs::write(seat.join("skill.yaml"), "name: seat_ctl\ndomain: vehicle_control\n").unwrap();

    let registry = FileBasedSkillRegistry::new();
    registry.load(first_root.path()).await.unwrap();
    assert!(registry.capability("set_speed").await.unwrap().is_some());

    registry.load(second_root.path()).await.unwrap();

    // Old package gone, new package in — never a merged view.
    assert!(registry.capability("set_speed").await.unwrap().is_none());
    let vehicle = registry.find_by_domain(DomainType::VehicleControl);
    assert_eq!(vehicle.len(), 1);
    assert_eq!(vehicle[0].name, "seat_ctl");
}

#[tokio::test]
async fn package_without_schema_resolves_its_fallback_capability() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("greeter");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("skill.yaml"), "name: greeter\ndomain: chat\n").unwrap();

    let registry = Arc::new(FileBasedSkillRegistry::new());
    registry.load(tmp.path()).await.unwrap();

    let resolved = registry
        .resolve_capability(DomainType::Chat, None)
        .await
        .unwrap()
        .expect("fallback capability");
    assert_eq!(resolved.capability_name, "greeter");
    assert!(resolved.slots.is_empty());

    // The fallback is executable like any declared capability.
    struct Greet;

    #[async_trait]
    impl CapabilityHandler for Greet {
        async fn handle(
            &self,
            _slots: &HashMap<String, Value>,
            _context: &SkillContext,
        ) -> anyhow::Result<ExecutionOutcome> {
            Ok(ExecutionOutcome::empty().with_tts("hello there"))
        }
    }

    let executor = Arc::new(SkillExecutor::new());
    executor.register_handler("greeter", Arc::new(Greet));

    let orchestrator = FileBasedSkillOrchestrator::new(registry, executor);
    let routing = DomainRouting::new(DomainType::Chat, "say hi", 0.9);

    let result = orchestrator
        .handle(&routing, &SkillContext::default())
        .await
        .unwrap();
    assert_eq!(result.disposition, Disposition::Executed);
    assert_eq!(result.tts_text, "hello there");
}

// ═══════════════════════════════════════════════════════════════════════
//  Global singleton semantics
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn global_reset_empties_resolution_until_the_next_load() {
    let tmp = tempfile::tempdir().unwrap();
    write_wiper_package(tmp.path());

    reset_global_registry();
    let registry = global_registry();
    registry.load(tmp.path()).await.unwrap();
    assert!(
        registry
            .resolve_capability(DomainType::VehicleControl, Some("set_speed"))
            .await
            .unwrap()
            .is_some()
    );

    reset_global_registry();

    let fresh = global_registry();
    assert!(
        fresh
            .resolve_capability(DomainType::VehicleControl, Some("set_speed"))
            .await
            .unwrap()
            .is_none()
    );

    fresh.load(tmp.path()).await.unwrap();
    assert!(
        fresh
            .resolve_capability(DomainType::VehicleControl, Some("set_speed"))
            .await
            .unwrap()
            .is_some()
    );

    reset_global_registry();
}

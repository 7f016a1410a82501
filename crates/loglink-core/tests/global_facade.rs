//! Process-wide facade over the global module table
//!
//! The global facade resolves once per process, so the whole lifecycle runs
//! as a single test.

use std::sync::Arc;

use serde_json::json;

use loglink_core::backends::memlog::{MemLevel, MemLogBackend};
use loglink_core::{
    current_provider, facade, find_type, get_logger, initialization_state, is_disabled, open_mapped_context,
    open_nested_context, set_diagnostic_sink, set_disabled, CaptureSink, InitializationState, LogLevel,
    ProviderKind,
};

#[test]
fn test_global_lifecycle() {
    let backend = MemLogBackend::modern();
    backend.load();
    assert!(find_type("memlog.LogManager", "memlog").is_some());

    // Building the facade installs the configured sink; replace it afterwards
    let _ = facade::global();
    let sink = Arc::new(CaptureSink::new());
    set_diagnostic_sink(sink.clone());

    assert!(matches!(initialization_state(), InitializationState::NotStarted));
    let logger = get_logger("global");
    assert!(matches!(initialization_state(), InitializationState::Succeeded));
    assert_eq!(current_provider().unwrap(), ProviderKind::MemLog);

    {
        let _tenant = open_mapped_context("tenant", "acme", false);
        let _job = open_nested_context(json!({"job": 1}));
        assert!(logger.info("started").unwrap());
    }
    let records = backend.records();
    assert_eq!(records[0].logger, "global");
    assert_eq!(records[0].level, MemLevel::Info);
    assert_eq!(records[0].mapped.get("tenant"), Some(&json!("acme")));
    assert_eq!(records[0].nested, vec![json!({"job": 1})]);

    set_disabled(true);
    assert!(is_disabled());
    assert!(!logger.error("muted").unwrap());
    assert!(open_nested_context("muted").is_noop());
    set_disabled(false);

    // Faults reach the sink installed after the facade was built
    backend.set_failing(true);
    assert!(!logger.warn("lost").unwrap());
    assert!(!logger.warn("lost again").unwrap());
    backend.set_failing(false);
    assert!(logger.warn("recovered").unwrap());

    assert_eq!(sink.count(LogLevel::Error, "memlog target failure"), 1);
    assert_eq!(sink.count(LogLevel::Warn, "failed 1 more time(s)"), 1);
    assert_eq!(backend.records().last().unwrap().message, "recovered");
    assert!(!is_disabled());
    assert_eq!(get_logger("other").provider(), Some(ProviderKind::MemLog));
}

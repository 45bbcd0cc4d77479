use anyhow::Result;
use nexus_streams::processors::{run_processor, NumericProcessor};
use nexus_streams::records::read_records;
use nexus_streams::{NexusError, PipelineManager, RawRecord};
use serde_json::json;

#[test]
fn test_mixed_batch_through_all_pipelines() -> Result<()> {
    let input = json!([
        "{\"sensor\": \"temp\", \"value\": 23.5}",
        "alice,login,1",
        [20, 22, 24, 21, 23],
        "temp:31"
    ])
    .to_string();
    let batch = read_records(input.as_bytes())?;

    let mut manager = PipelineManager::default();
    let report = manager.process_data(&batch);

    assert_eq!(
        report.outputs,
        vec![
            "Processed temp reading: 23.5°C (Normal range)".to_string(),
            "User activity: alice performed login".to_string(),
            "Stream summary: 5 readings, avg: 22.00".to_string(),
            "Processed temp reading: 31°C (Critical range)".to_string(),
        ]
    );
    assert_eq!(report.failures, 0);

    let context = manager.context();
    assert_eq!(context.total, 4);
    assert_eq!(context.lineage_report(), "JSON_001 -> CSV_001 -> STREAM_001");
    assert_eq!(manager.efficiency(), 100);
    Ok(())
}

#[test]
fn test_recovery_keeps_context_consistent() {
    let mut manager = PipelineManager::default();
    let report = manager.process_data(&[
        RawRecord::text("temp:22"),
        RawRecord::text("{\"sensor\": \"temp\", \"value\": "),
        RawRecord::text("pressure:1000"),
        RawRecord::text("bob,login"),
        RawRecord::text("no delimiter here"),
    ]);

    assert_eq!(report.outputs.len(), 1);
    assert_eq!(report.failures, 3);
    assert_eq!(report.skipped, 1);

    let context = manager.context();
    assert_eq!(context.total, 4);
    assert_eq!(context.failures, 3);
    assert_eq!(context.successes() + context.failures, context.total);
    assert_eq!(context.recovery_log.len(), context.failures as usize);
    assert_eq!(context.efficiency(), 25);

    let kinds: Vec<&str> = context.recovery_log.iter().map(|r| r.error_type).collect();
    assert_eq!(kinds, vec!["format", "domain", "format"]);
}

#[test]
fn test_failure_names_pipeline_and_stage() {
    let manager = PipelineManager::default();
    let encoded = &manager.pipelines()[0];

    let err = encoded
        .process(RawRecord::text("temp:warm"))
        .expect_err("non-numeric reading must fail");
    assert!(matches!(err, NexusError::Pipeline { .. }));
    let message = err.to_string();
    assert!(message.contains("JSON_001"), "{message}");
}

#[test]
fn test_context_survives_multiple_batches() {
    let mut manager = PipelineManager::default();
    manager.process_data(&[RawRecord::text("temp:22"), RawRecord::text("temp:x")]);
    manager.process_data(&[RawRecord::sequence([1, 2, 3])]);

    let context = manager.context();
    assert_eq!(context.total, 3);
    assert_eq!(context.failures, 1);
    assert_eq!(context.lineage.len(), 3);
    assert_eq!(context.efficiency(), 67);
}

#[test]
fn test_extreme_integers_are_isolated_per_record() {
    let mut manager = PipelineManager::default();
    let report = manager.process_data(&[
        RawRecord::sequence([i64::MAX, 1]),
        RawRecord::sequence([i64::MIN, -1]),
        RawRecord::sequence([i64::MAX, i64::MIN]),
        RawRecord::text("temp:22"),
    ]);

    assert_eq!(report.failures, 2);
    assert_eq!(
        report.outputs,
        vec![
            "Stream summary: 2 readings, avg: -0.50".to_string(),
            "Processed temp reading: 22°C (Normal range)".to_string(),
        ]
    );
    let context = manager.context();
    assert_eq!(context.total, 4);
    assert_eq!(context.recovery_log.len(), 2);
    assert_eq!(context.efficiency(), 50);
}

#[test]
fn test_numeric_processor_survives_extreme_integers() {
    let batch = [
        RawRecord::sequence([i64::MAX, 1]),
        RawRecord::sequence([i64::MIN]),
        RawRecord::sequence([1, 2, 3]),
    ];
    let results: Vec<_> = batch
        .iter()
        .map(|record| run_processor(&NumericProcessor, record))
        .collect();

    assert!(matches!(results[0], Err(NexusError::Domain(_))));
    assert!(results[1].is_ok());
    assert_eq!(
        results[2].as_deref().ok(),
        Some("Processed 3 numeric value(s), sum=6, avg=2.00")
    );
}

use anyhow::Result;
use nexus_streams::streams::{classify, SensorPolicy, SensorReading, Stream};
use nexus_streams::{Criteria, NexusError, RawRecord, StreamDispatcher, StreamKind};
use serde_json::json;

fn records(value: serde_json::Value) -> Result<Vec<RawRecord>> {
    Ok(serde_json::from_value(value)?)
}

#[test]
fn test_classification_is_total() -> Result<()> {
    let batch = records(json!([
        {"tuple": [22.5, 65.0, 1013.0]},
        [10, -5, 20],
        ["login", "logout"],
        "temp:23",
        {"user": "alice"},
        7,
        [],
        [1.5, 2.5]
    ]))?;

    let outcomes: Vec<_> = batch.iter().map(classify).collect();
    assert_eq!(outcomes.len(), batch.len());
    let kinds: Vec<Option<StreamKind>> =
        outcomes.iter().map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(
        kinds,
        vec![
            Some(StreamKind::Sensor),
            Some(StreamKind::Transaction),
            Some(StreamKind::Event),
            None,
            None,
            None,
            None,
            None
        ]
    );
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, NexusError::UnclassifiableRecord(_))));
    Ok(())
}

#[test]
fn test_sensor_filter_never_raises_past_boundary() -> Result<()> {
    let batch = records(json!([
        {"tuple": [22.0, 40.0, 1000.0]},
        {"tuple": ["hot", 40.0, 1000.0]},
        {"tuple": [22.0, 40.0]},
        "temp:23",
        [1, 2, 3]
    ]))?;

    let mut stream = Stream::new(SensorPolicy);
    let outcome = stream.filter(&batch, None);
    assert_eq!(outcome.accepted.len() + outcome.invalid, batch.len());
    assert_eq!(outcome.accepted.len(), 1);
    Ok(())
}

#[test]
fn test_sensor_criterion_example() {
    let mut stream = Stream::new(SensorPolicy);
    let outcome = stream.filter(
        &[
            RawRecord::tuple([31.0, 1.0, 1.0]),
            RawRecord::tuple([29.0, 1.0, 1.0]),
        ],
        Some(">30"),
    );

    let reading = |t| SensorReading { temperature: t, humidity: 1.0, pressure: 1.0 };
    assert_eq!(outcome.accepted, vec![reading(31.0)]);
    assert_eq!(outcome.rejected, vec![reading(29.0)]);
}

#[test]
fn test_dispatcher_end_to_end() -> Result<()> {
    let batch = records(json!([
        {"tuple": [22.5, 65.0, 1013.0]},
        {"tuple": [23.5, 66.0, 1012.0]},
        [10, -5, 20, -3],
        ["login", "error", "logout", "error"]
    ]))?;

    let mut dispatcher = StreamDispatcher::default();
    let report = dispatcher.dispatch(&batch, &Criteria::default())?;

    assert_eq!(report.summaries.len(), 3);
    assert_eq!(
        report.summaries[1].1,
        "Transaction analysis: 4 operations, net flow: +22 units"
    );

    let sensor = dispatcher.stats_for(StreamKind::Sensor);
    assert_eq!(sensor.count, 2);
    assert_eq!(sensor.metrics["avg_temperature"], 23.0);
    assert_eq!(sensor.metrics["avg_humidity"], 65.5);

    let event = dispatcher.stats_for(StreamKind::Event);
    assert_eq!(event.metrics["error_events"], 2.0);

    let snapshot = serde_json::to_value(&report.stats)?;
    assert_eq!(snapshot[1]["kind"], "transaction");
    assert_eq!(snapshot[1]["count"], 4);
    assert!(snapshot[0]["rejected"].as_array().is_some());
    Ok(())
}

#[test]
fn test_split_batches_match_single_batch() -> Result<()> {
    let first = records(json!([{"tuple": [20.0, 30.0, 1000.0]}, [5, -2]]))?;
    let second = records(json!([{"tuple": [26.0, 50.0, 1010.0]}, [7, -4]]))?;

    let mut split = StreamDispatcher::default();
    split.dispatch(&first, &Criteria::default())?;
    split.dispatch(&second, &Criteria::default())?;

    let mut joined = StreamDispatcher::default();
    let all: Vec<RawRecord> = first.into_iter().chain(second).collect();
    joined.dispatch(&all, &Criteria::default())?;

    assert_eq!(
        split.stats_for(StreamKind::Sensor),
        joined.stats_for(StreamKind::Sensor)
    );
    let (s, j) = (
        split.stats_for(StreamKind::Transaction),
        joined.stats_for(StreamKind::Transaction),
    );
    assert_eq!(s.count, j.count);
    assert_eq!(s.metrics["avg_buy"], j.metrics["avg_buy"]);
    assert_eq!(s.metrics["avg_sell"], j.metrics["avg_sell"]);
    Ok(())
}

#[test]
fn test_extreme_transactions_do_not_abort_dispatch() -> Result<()> {
    let batch = vec![
        RawRecord::sequence([i64::MAX, 1]),
        RawRecord::sequence([i64::MIN, -1]),
        RawRecord::sequence([5, -3]),
        RawRecord::tuple([21.0, 40.0, 1000.0]),
    ];

    let mut dispatcher = StreamDispatcher::default();
    let report = dispatcher.dispatch(&batch, &Criteria::default())?;
    assert_eq!(report.summaries.len(), 2);

    let transactions = dispatcher.stats_for(StreamKind::Transaction);
    assert_eq!(transactions.count, 2);
    assert_eq!(transactions.metrics["net_flow"], 2.0);
    assert_eq!(dispatcher.stats_for(StreamKind::Sensor).count, 1);

    let report = dispatcher.dispatch(&[RawRecord::sequence([4, -4])], &Criteria::default())?;
    assert_eq!(
        report.summaries[0].1,
        "Transaction analysis: 2 operations, net flow: +0 units"
    );
    assert_eq!(dispatcher.stats_for(StreamKind::Transaction).count, 4);
    Ok(())
}

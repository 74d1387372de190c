mod common;

use common::fixtures::*;
use common::{TestResult, init_logging};
use quire::data::{DefaultTableModel, Parameters, TableDataFactory};
use quire::engine::CountingSink;
use quire::engine::config::{CACHE_BACKEND, CACHE_CAPACITY};
use quire::types::Value;
use quire::{EngineConfig, ReportBuilder, ReportJob, ReportProcessor};
use std::collections::HashMap;
use std::sync::Arc;

/// A report whose master query filters the orders by the `region` parameter.
fn regional_job(processor: ReportProcessor) -> (ReportJob, Arc<quire::data::FactoryProbe>) {
    let factory = TableDataFactory::new().with_query("orders", |parameters| {
        let region = parameters.get("region").cloned().unwrap_or_default();
        let mut table = DefaultTableModel::new(["order_id", "region"]);
        for id in 1..=5 {
            table = table.with_row(vec![Value::from(id), region.clone()]);
        }
        Ok(table)
    });
    let probe = factory.probe();
    let report = ReportBuilder::new("regional")
        .query("orders")
        .parameter("region", "East")
        .data_factory(Arc::new(factory))
        .item_band(order_row())
        .build();
    (ReportJob::new(Arc::new(report), processor), probe)
}

fn processor_with(properties: &[(&str, &str)]) -> Result<ReportProcessor, Box<dyn std::error::Error>> {
    let properties: HashMap<String, String> = properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Ok(ReportProcessor::new(EngineConfig::from_properties(&properties)?))
}

#[test]
fn test_repeated_validation_executes_the_query_once() -> TestResult {
    init_logging();
    let (factory, probe) = orders_factory(orders(12));
    let report = orders_report(orders(0)).data_factory(factory).build();
    let job = ReportJob::new(Arc::new(report), ReportProcessor::default());

    for _ in 0..3 {
        job.validate_parameters(&Parameters::new())?;
    }
    let stats = job.cache_statistics();
    assert_eq!(stats.put_count, 1);
    assert_eq!(stats.get_count, 3);
    assert_eq!(stats.hit_count, 2);
    assert_eq!(stats.miss_count(), 1);
    assert_eq!(probe.executions(), 1);

    let mut sink = CountingSink::default();
    let outcome = job.render(&Parameters::new(), &mut sink);
    assert!(outcome.succeeded, "{:?}", outcome.error_reason);
    assert_eq!(outcome.statistics.rows, 12);
    assert_eq!(probe.executions(), 1);
    assert_eq!(probe.open_instances(), 0);
    Ok(())
}

#[test]
fn test_parameters_are_part_of_the_cache_key() -> TestResult {
    init_logging();
    let (job, probe) = regional_job(ReportProcessor::default());

    job.validate_parameters(&Parameters::new())?;
    job.validate_parameters(&Parameters::new().with("region", "East"))?;
    assert_eq!(probe.executions(), 1, "the default equals the explicit value");

    job.validate_parameters(&Parameters::new().with("region", "West"))?;
    job.validate_parameters(&Parameters::new().with("region", "West"))?;
    assert_eq!(probe.executions(), 2);
    assert_eq!(job.cache_statistics().entries, 2);
    Ok(())
}

#[test]
fn test_lfu_backend_respects_its_capacity() -> TestResult {
    init_logging();
    let processor = processor_with(&[(CACHE_BACKEND, "lfu"), (CACHE_CAPACITY, "1")])?;
    let (job, probe) = regional_job(processor);

    for region in ["East", "West", "North"] {
        job.validate_parameters(&Parameters::new().with("region", region))?;
        assert!(job.cache_statistics().entries <= 1);
    }
    assert_eq!(probe.executions(), 3);
    Ok(())
}

#[test]
fn test_disabled_cache_executes_every_time() -> TestResult {
    init_logging();
    let processor = processor_with(&[(CACHE_BACKEND, "none")])?;
    let (job, probe) = regional_job(processor);

    for _ in 0..3 {
        job.validate_parameters(&Parameters::new())?;
    }
    assert_eq!(probe.executions(), 3);
    assert_eq!(job.cache_statistics().entries, 0);
    Ok(())
}

#[test]
fn test_unknown_backend_is_a_configuration_error() {
    assert!(processor_with(&[(CACHE_BACKEND, "redis")]).is_err());
}

//! Run protocol of the pipeline orchestrator.

use std::cell::RefCell;
use std::rc::Rc;

use lynx_ingest::{BatchIter, DataSource, SourceError};
use lynx_load::{DataLoader, LoadError, LoadSummary};
use lynx_model::{MappingConfig, PIPELINE_ERROR_KEY, PipelineStatus, TargetType};
use lynx_transform::ColumnMappingTransformer;
use lynx_core::{PipelineError, PipelineOrchestrator};
use polars::prelude::*;

struct VecSource {
    batches: Option<Vec<Result<DataFrame, SourceError>>>,
}

impl VecSource {
    fn new(batches: Vec<Result<DataFrame, SourceError>>) -> Box<Self> {
        Box::new(Self {
            batches: Some(batches),
        })
    }
}

impl DataSource for VecSource {
    fn extract(&mut self) -> BatchIter<'_> {
        match self.batches.take() {
            Some(batches) => Box::new(batches.into_iter()),
            None => Box::new(std::iter::once(Err(SourceError::AlreadyExtracted))),
        }
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// Accepts every batch except the one at `fail_on` (0-based).
struct CountingLoader {
    fail_on: Option<usize>,
    seen: Rc<RefCell<Vec<usize>>>,
}

impl DataLoader for CountingLoader {
    fn load(&mut self, batch: &DataFrame) -> Result<LoadSummary, LoadError> {
        let index = self.seen.borrow().len();
        self.seen.borrow_mut().push(batch.height());
        if self.fail_on == Some(index) {
            return Err(LoadError::InvalidResponse {
                url: "http://test/imports".to_string(),
                message: "import rejected".to_string(),
            });
        }
        Ok(LoadSummary {
            rows: batch.height(),
            chunks: Vec::new(),
        })
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

fn batch(start: i64) -> DataFrame {
    DataFrame::new(vec![
        Series::new("n".into(), (start..start + 5).collect::<Vec<_>>()).into(),
    ])
    .unwrap()
}

fn orchestrator(
    batches: Vec<Result<DataFrame, SourceError>>,
    fail_on: Option<usize>,
) -> (PipelineOrchestrator, Rc<RefCell<Vec<usize>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let loader = CountingLoader {
        fail_on,
        seen: Rc::clone(&seen),
    };
    let pipeline = PipelineOrchestrator::new(
        VecSource::new(batches),
        Box::new(ColumnMappingTransformer::default()),
        Box::new(loader),
    );
    (pipeline, seen)
}

#[test]
fn two_batches_complete_with_ten_records() {
    let (mut pipeline, seen) = orchestrator(vec![Ok(batch(0)), Ok(batch(5))], None);

    assert_eq!(pipeline.run().unwrap(), 10);
    let state = pipeline.state();
    assert_eq!(state.status, PipelineStatus::Completed);
    assert_eq!(state.records_processed, 10);
    assert!(state.errors.is_empty());
    assert!(state.start_time.is_some());
    assert!(state.end_time >= state.start_time);
    assert_eq!(*seen.borrow(), vec![5, 5]);
}

#[test]
fn load_failure_on_second_batch_fails_the_run() {
    let (mut pipeline, seen) =
        orchestrator(vec![Ok(batch(0)), Ok(batch(5)), Ok(batch(10))], Some(1));

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Load(_)));

    let state = pipeline.state();
    assert_eq!(state.status, PipelineStatus::Failed);
    assert_eq!(state.records_processed, 5);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[PIPELINE_ERROR_KEY], err.to_string());
    assert!(state.end_time.is_some());
    // third batch never reaches the loader
    assert_eq!(*seen.borrow(), vec![5, 5]);
}

#[test]
fn extraction_failure_is_recorded() {
    let (mut pipeline, seen) = orchestrator(
        vec![
            Ok(batch(0)),
            Err(SourceError::NotFound {
                path: "missing.csv".into(),
            }),
        ],
        None,
    );

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Source(SourceError::NotFound { .. })));
    assert_eq!(pipeline.state().status, PipelineStatus::Failed);
    assert_eq!(pipeline.state().records_processed, 5);
    assert!(pipeline.state().errors[PIPELINE_ERROR_KEY].contains("missing.csv"));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn transform_failure_stops_before_loading() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mapping = MappingConfig {
        type_conversions: [("code".to_string(), TargetType::Int64)].into(),
        ..MappingConfig::default()
    };
    let text = DataFrame::new(vec![Series::new("code".into(), vec!["A1"]).into()]).unwrap();
    let mut pipeline = PipelineOrchestrator::new(
        VecSource::new(vec![Ok(text)]),
        Box::new(ColumnMappingTransformer::new(mapping)),
        Box::new(CountingLoader {
            fail_on: None,
            seen: Rc::clone(&seen),
        }),
    )
    .with_name("codes");

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::Transform(_)));
    assert!(err.to_string().contains("'code'"));
    assert_eq!(pipeline.name(), "codes");
    assert!(seen.borrow().is_empty());
}

#[test]
fn empty_source_completes_with_zero_records() {
    let (mut pipeline, _) = orchestrator(Vec::new(), None);
    assert_eq!(pipeline.run().unwrap(), 0);
    assert_eq!(pipeline.state().status, PipelineStatus::Completed);
}

#[test]
fn second_run_requires_reset() {
    let (mut pipeline, _) = orchestrator(vec![Ok(batch(0))], None);
    pipeline.run().unwrap();

    let before = pipeline.state().clone();
    assert!(matches!(
        pipeline.run(),
        Err(PipelineError::AlreadyRun {
            status: PipelineStatus::Completed
        })
    ));
    assert_eq!(pipeline.state(), &before);

    pipeline.reset();
    assert_eq!(pipeline.state().status, PipelineStatus::Initialized);
    // the source is spent, so the rerun fails at extraction
    let err = pipeline.run().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Source(SourceError::AlreadyExtracted)
    ));
    assert_eq!(pipeline.state().status, PipelineStatus::Failed);
}

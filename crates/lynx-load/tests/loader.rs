//! Retry and chunking behaviour of the import loader.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use lynx_load::{
    DataLoader, ImportClient, ImportLoader, ImportResponse, ImportStatus, LoadError, RetryPolicy,
    Sleeper,
};
use polars::prelude::*;
use serde_json::Value;

/// Replies from a script; once the script runs out every call succeeds.
#[derive(Default)]
struct ScriptedClient {
    script: VecDeque<Result<ImportStatus, String>>,
    calls: Rc<RefCell<Vec<usize>>>,
}

impl ScriptedClient {
    fn new(script: Vec<Result<ImportStatus, String>>) -> (Self, Rc<RefCell<Vec<usize>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let client = Self {
            script: script.into(),
            calls: Rc::clone(&calls),
        };
        (client, calls)
    }
}

impl ImportClient for ScriptedClient {
    fn create_import(&mut self, nodes: &[Value]) -> Result<ImportResponse, LoadError> {
        self.calls.borrow_mut().push(nodes.len());
        match self.script.pop_front().unwrap_or(Ok(ImportStatus::Ready)) {
            Ok(status) => Ok(ImportResponse::new(Some("imp".to_string()), status)),
            Err(message) => Err(LoadError::Http {
                url: "http://test/imports".to_string(),
                status: 503,
                message,
            }),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Clone, Default)]
struct RecordingSleeper(Rc<RefCell<Vec<Duration>>>);

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

fn rows(n: i64) -> DataFrame {
    DataFrame::new(vec![
        Series::new("id".into(), (0..n).map(|i| format!("EQ{i}")).collect::<Vec<_>>()).into(),
    ])
    .unwrap()
}

fn loader(
    client: ScriptedClient,
    chunk_size: usize,
    sleeper: &RecordingSleeper,
) -> ImportLoader<ScriptedClient> {
    ImportLoader::new(client)
        .with_chunk_size(chunk_size)
        .with_retry(RetryPolicy::new(3, Duration::from_millis(100)))
        .with_sleeper(Box::new(sleeper.clone()))
}

#[test]
fn fails_twice_then_succeeds_in_three_attempts() {
    let (client, calls) = ScriptedClient::new(vec![
        Err("unavailable".to_string()),
        Err("unavailable".to_string()),
    ]);
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 10, &sleeper);

    let summary = loader.load(&rows(4)).unwrap();
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.chunks.len(), 1);
    assert_eq!(summary.chunks[0].attempts, 3);
    assert_eq!(calls.borrow().len(), 3);
    assert_eq!(
        *sleeper.0.borrow(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}

#[test]
fn exhausted_chunk_fails_the_load_and_stops() {
    let (client, calls) = ScriptedClient::new(vec![
        Ok(ImportStatus::Ready),
        Err("down".to_string()),
        Err("down".to_string()),
        Err("still down".to_string()),
    ]);
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 2, &sleeper);

    let err = loader.load(&rows(6)).unwrap_err();
    match &err {
        LoadError::ChunkFailed {
            chunk_index,
            attempts,
            source,
        } => {
            assert_eq!(*chunk_index, 1);
            assert_eq!(*attempts, 3);
            assert!(source.to_string().contains("still down"));
        }
        other => panic!("expected chunk failure, got {other:?}"),
    }
    // chunk 0 once, chunk 1 three times, chunk 2 never
    assert_eq!(*calls.borrow(), vec![2, 2, 2, 2]);
    assert!(err.to_string().starts_with("chunk 1 failed after 3 attempts"));
}

#[test]
fn rejected_status_is_retried() {
    let (client, calls) = ScriptedClient::new(vec![Ok(ImportStatus::Error)]);
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 10, &sleeper);

    let summary = loader.load(&rows(1)).unwrap();
    assert_eq!(summary.chunks[0].attempts, 2);
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn batch_is_split_into_chunks_in_order() {
    let (client, calls) = ScriptedClient::new(Vec::new());
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 3, &sleeper);

    let summary = loader.load(&rows(7)).unwrap();
    assert_eq!(*calls.borrow(), vec![3, 3, 1]);
    let indexes: Vec<_> = summary.chunks.iter().map(|chunk| chunk.index).collect();
    assert_eq!(indexes, [0, 1, 2]);
    assert_eq!(summary.total_attempts(), 3);
    assert!(sleeper.0.borrow().is_empty());
}

#[test]
fn empty_batch_sends_nothing() {
    let (client, calls) = ScriptedClient::new(Vec::new());
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 3, &sleeper);

    let summary = loader.load(&rows(0)).unwrap();
    assert_eq!(summary.rows, 0);
    assert!(summary.chunks.is_empty());
    assert!(calls.borrow().is_empty());
}

#[test]
fn zero_chunk_size_is_rejected() {
    let (client, _) = ScriptedClient::new(Vec::new());
    let sleeper = RecordingSleeper::default();
    let mut loader = loader(client, 0, &sleeper);
    assert!(matches!(
        loader.load(&rows(1)),
        Err(LoadError::InvalidChunkSize)
    ));
}

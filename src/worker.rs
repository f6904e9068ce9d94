//! Async shell around the synchronous [generator](PuzzleGenerator).
//!
//! Generation is CPU bound, so it always runs on `spawn_blocking` threads and talks back over bounded channels.
//! [GenerationTask] runs a single job, [spawn_worker] runs a small message protocol that can host many jobs.

use std::{any::Any, collections::HashMap, panic::{self, AssertUnwindSafe}, pin::Pin, sync::{atomic::{AtomicBool, Ordering}, Arc, Mutex, PoisonError}, task::{Context, Poll}};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc::{self, Receiver, Sender}, task::{self, JoinHandle}};
use tokio_stream::Stream;

use crate::{error::{GenerationError, WorkerError}, generator::{GeneratorSettings, MultiPuzzleOutcome, Progress, PuzzleGenerator}, traits::WordKey, word::Word};

const CHANNEL_CAPACITY: usize = 100;

/// One multi puzzle generation running in the background.
///
/// # Example
/// ```
/// use vocab_crossword::generator::GeneratorSettings;
/// use vocab_crossword::word::Word;
/// use vocab_crossword::worker::GenerationTask;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main()
/// {
///     let words = vec![Word::new(1, "master", ""), Word::new(2, "steam", ""), Word::new(3, "tea", "")];
///     let task = GenerationTask::spawn(words, GeneratorSettings::default());
///     let outcome = task.join().await.unwrap();
///     assert_eq!(outcome.puzzles.len(), 1);
/// }
/// ```
pub struct GenerationTask<Id: WordKey + 'static>
{
    cancel: Arc<AtomicBool>,
    progress: Option<Receiver<Progress>>,
    handle: JoinHandle<Result<MultiPuzzleOutcome<Id>, GenerationError>>,
}

impl<Id: WordKey + 'static> GenerationTask<Id>
{
    /// Starts generating, must be called from within a tokio runtime
    pub fn spawn(words: Vec<Word<Id>>, settings: GeneratorSettings) -> GenerationTask<Id>
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let (progress_sender, progress_receiver) = mpsc::channel(CHANNEL_CAPACITY);

        let flag = cancel.clone();
        let handle = task::spawn_blocking(move ||
        {
            // progress is best effort, a full channel drops the update
            let report = move |progress: Progress| { let _ = progress_sender.try_send(progress); };
            guarded(|| PuzzleGenerator::new(&settings).with_cancel_flag(&flag).with_progress(&report).generate_puzzles(&words))
        });

        GenerationTask { cancel, progress: Some(progress_receiver), handle }
    }

    /// Receiver of progress updates, only the first call gets it
    pub fn progress(&mut self) -> Option<Receiver<Progress>>
    {
        self.progress.take()
    }

    /// Asks the generation to stop, [join](Self::join) then gives [GenerationError::Cancelled]
    pub fn cancel(&self)
    {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub async fn join(self) -> Result<MultiPuzzleOutcome<Id>, GenerationError>
    {
        match self.handle.await
        {
            Ok(result) => result,
            Err(e) => Err(GenerationError::Internal(e.to_string())),
        }
    }
}

/// Words and settings of one job, settings left out take their defaults
#[derive(Clone, PartialEq, Default, Debug, Serialize, Deserialize)]
pub struct GeneratePayload
{
    pub words: Vec<Word<String>>,
    /// Generator and clustering settings in one flat object
    #[serde(default)]
    pub config: GeneratorSettings,
}

/// Message to a [worker](WorkerHandle), `{"id", "type", "payload"}` on the wire
///
/// ```
/// # use vocab_crossword::worker::WorkerRequest;
/// let request: WorkerRequest = serde_json::from_str(r#"{"id": "job-1", "type": "cancel"}"#).unwrap();
/// assert_eq!(request, WorkerRequest::cancel("job-1"));
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WorkerRequest
{
    pub id: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RequestBody
{
    Generate(GeneratePayload),
    /// No-op for ids that are not running
    Cancel,
}

impl WorkerRequest
{
    pub fn generate(id: impl Into<String>, payload: GeneratePayload) -> WorkerRequest
    {
        WorkerRequest { id: id.into(), body: RequestBody::Generate(payload) }
    }

    pub fn cancel(id: impl Into<String>) -> WorkerRequest
    {
        WorkerRequest { id: id.into(), body: RequestBody::Cancel }
    }
}

/// Message from a [worker](WorkerHandle), `{"id", "type", "payload"}` on the wire
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WorkerResponse
{
    /// Job the message is about, absent on `ready`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ResponseBody
{
    /// Sent once, before anything else
    Ready,
    Progress(Progress),
    Complete(Box<MultiPuzzleOutcome<String>>),
    Error(ErrorReport),
    Cancelled,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErrorReport
{
    /// [GenerationError::code], or `duplicate_job`
    pub code: String,
    pub message: String,
}

impl WorkerResponse
{
    pub fn ready() -> WorkerResponse
    {
        WorkerResponse { id: None, body: ResponseBody::Ready }
    }

    pub fn for_job(id: impl Into<String>, body: ResponseBody) -> WorkerResponse
    {
        WorkerResponse { id: Some(id.into()), body }
    }

    pub fn error(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> WorkerResponse
    {
        WorkerResponse::for_job(id, ResponseBody::Error(ErrorReport { code: code.into(), message: message.into() }))
    }
}

/// Text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String
{
    payload.downcast_ref::<&str>().map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Runs a generation, a panic becomes [GenerationError::Internal]
fn guarded<T>(generation: impl FnOnce() -> Result<T, GenerationError>) -> Result<T, GenerationError>
{
    panic::catch_unwind(AssertUnwindSafe(generation))
        .unwrap_or_else(|payload| Err(GenerationError::Internal(panic_message(&*payload))))
}

/// Cancel flags of the running jobs
#[derive(Default, Debug)]
struct JobRegistry
{
    jobs: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl JobRegistry
{
    /// Registers `id`, None if a job with that id is already running
    fn start(&self, id: &str) -> Option<Arc<AtomicBool>>
    {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(id) { return None; }

        let flag = Arc::new(AtomicBool::new(false));
        jobs.insert(id.to_owned(), flag.clone());
        Some(flag)
    }

    fn cancel(&self, id: &str) -> bool
    {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match jobs.get(id)
        {
            Some(flag) => { flag.store(true, Ordering::Relaxed); true }
            None => false,
        }
    }

    fn finish(&self, id: &str)
    {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).remove(id);
    }
}

/// Handle to a worker started with [spawn_worker], a [Stream] of its [responses](WorkerResponse).
///
/// The stream ends after [close](WorkerHandle::close) once every running job has sent its final message.
///
/// # Example
/// ```
/// use vocab_crossword::word::Word;
/// use vocab_crossword::worker::{spawn_worker, GeneratePayload, ResponseBody, WorkerRequest, WorkerResponse};
/// use tokio_stream::StreamExt;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main()
/// {
///     let mut worker = spawn_worker();
///     let words = vec![Word::new("1".to_owned(), "steam", ""), Word::new("2".to_owned(), "tea", "")];
///     worker.send(WorkerRequest::generate("job", GeneratePayload { words, ..Default::default() })).await.unwrap();
///     worker.close();
///
///     let responses: Vec<WorkerResponse> = worker.collect().await;
///     assert_eq!(responses.first(), Some(&WorkerResponse::ready()));
///     assert!(matches!(responses.last().map(|r| &r.body), Some(ResponseBody::Complete(_))));
/// }
/// ```
pub struct WorkerHandle
{
    request_sender: Option<Sender<WorkerRequest>>,
    response_receiver: Receiver<WorkerResponse>,
}

impl WorkerHandle
{
    pub async fn send(&self, request: WorkerRequest) -> Result<(), WorkerError>
    {
        match &self.request_sender
        {
            Some(sender) => sender.send(request).await.map_err(|_| WorkerError::Closed),
            None => Err(WorkerError::Closed),
        }
    }

    /// Stops accepting requests, running jobs still finish
    pub fn close(&mut self)
    {
        self.request_sender = None;
    }
}

impl Stream for WorkerHandle
{
    type Item = WorkerResponse;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>>
    {
        self.response_receiver.poll_recv(cx)
    }
}

/// Starts a worker task, must be called from within a tokio runtime
pub fn spawn_worker() -> WorkerHandle
{
    let (request_sender, request_receiver) = mpsc::channel(CHANNEL_CAPACITY);
    let (response_sender, response_receiver) = mpsc::channel(CHANNEL_CAPACITY);

    task::spawn(run_worker(request_receiver, response_sender));

    WorkerHandle { request_sender: Some(request_sender), response_receiver }
}

async fn run_worker(mut requests: Receiver<WorkerRequest>, responses: Sender<WorkerResponse>)
{
    if responses.send(WorkerResponse::ready()).await.is_err() { return; }

    let registry = Arc::new(JobRegistry::default());
    let mut jobs = Vec::new();

    while let Some(WorkerRequest { id, body }) = requests.recv().await
    {
        match body
        {
            RequestBody::Generate(payload) =>
            {
                let Some(flag) = registry.start(&id) else
                {
                    let message = format!("A job with id {id} is already running.");
                    let _ = responses.send(WorkerResponse::error(id, "duplicate_job", message)).await;
                    continue;
                };

                log::debug!("starting job {id} with {} words", payload.words.len());
                let (registry, responses) = (registry.clone(), responses.clone());
                jobs.push(task::spawn_blocking(move || run_job(id, payload, flag, &registry, &responses)));
            }
            RequestBody::Cancel =>
            {
                if registry.cancel(&id) { log::debug!("cancelling job {id}"); }
            }
        }
    }

    join_all(jobs).await;
}

fn run_job(id: String, payload: GeneratePayload, cancel: Arc<AtomicBool>, registry: &JobRegistry, responses: &Sender<WorkerResponse>)
{
    let (progress_sender, progress_id) = (responses.clone(), id.clone());
    let report = move |progress: Progress|
    {
        let _ = progress_sender.try_send(WorkerResponse::for_job(progress_id.clone(), ResponseBody::Progress(progress)));
    };

    let result = guarded(|| PuzzleGenerator::new(&payload.config).with_cancel_flag(&cancel).with_progress(&report).generate_puzzles(&payload.words));
    registry.finish(&id);

    let response = match result
    {
        Ok(outcome) => WorkerResponse::for_job(id, ResponseBody::Complete(Box::new(outcome))),
        Err(GenerationError::Cancelled) => WorkerResponse::for_job(id, ResponseBody::Cancelled),
        Err(e) => WorkerResponse::error(id, e.code(), e.to_string()),
    };
    let _ = responses.blocking_send(response);
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{cluster::ClusterConfig, generator::Stage};
    use tokio_stream::StreamExt;

    const TERMS: [&str; 30] = [
        "planet", "garden", "trainer", "reader", "station", "orange", "silver", "winter", "summer", "lantern",
        "doctor", "animal", "island", "monster", "painter", "sister", "letter", "number", "pencil", "rabbit",
        "desert", "basket", "candle", "dinner", "mirror", "parent", "rocket", "singer", "tunnel", "window",
    ];

    fn words(terms: &[&str]) -> Vec<Word<String>>
    {
        terms.iter().enumerate().map(|(i, t)| Word::new(i.to_string(), t, "")).collect()
    }

    /// Large enough that a cancel sent right after the start lands before the first word
    fn many_words() -> Vec<Word<String>>
    {
        (0..3).flat_map(|round| TERMS.iter().map(move |t| Word::new(format!("{round}-{t}"), t, ""))).collect()
    }

    #[test]
    fn test_job_registry()
    {
        let registry = JobRegistry::default();
        let flag = registry.start("a").unwrap();

        assert!(registry.start("a").is_none());
        assert!(!registry.cancel("b"));
        assert!(registry.cancel("a"));
        assert!(flag.load(Ordering::Relaxed));

        registry.finish("a");
        assert!(!registry.cancel("a"));
        assert!(registry.start("a").is_some());
    }

    #[test]
    fn test_guarded_turns_panics_into_errors()
    {
        assert_eq!(guarded(|| -> Result<(), GenerationError> { panic!("boom") }), Err(GenerationError::Internal("boom".to_owned())));
        assert_eq!(guarded(|| -> Result<(), GenerationError> { panic!("{} words", 3) }), Err(GenerationError::Internal("3 words".to_owned())));
        assert_eq!(guarded(|| Ok::<_, GenerationError>(7)), Ok(7));
        assert_eq!(GenerationError::Internal(String::new()).code(), "internal");
    }

    #[test]
    fn test_request_wire_format()
    {
        let json = r#"{"id": "job-1", "type": "generate", "payload": {"words": [{"id": "w1", "term": "tea"}], "config": {"timeout_ms": 250, "target_cluster_size": 12}}}"#;
        let request: WorkerRequest = serde_json::from_str(json).unwrap();
        let RequestBody::Generate(payload) = request.body else { panic!("expected a generate request") };

        assert_eq!(request.id, "job-1");
        assert_eq!(payload.words[0].term, "TEA");
        assert_eq!(payload.words[0].clue, "");
        assert_eq!(payload.config.generator.timeout_ms, 250);
        assert_eq!(payload.config.generator.max_grid_size, 16);
        assert_eq!(payload.config.clustering, ClusterConfig { target_cluster_size: 12, ..Default::default() });

        assert_eq!(serde_json::to_string(&WorkerRequest::cancel("job-1")).unwrap(), r#"{"id":"job-1","type":"cancel"}"#);
    }

    #[test]
    fn test_response_wire_format()
    {
        assert_eq!(serde_json::to_string(&WorkerResponse::ready()).unwrap(), r#"{"type":"ready"}"#);
        assert_eq!(serde_json::to_string(&WorkerResponse::for_job("x", ResponseBody::Cancelled)).unwrap(), r#"{"id":"x","type":"cancelled"}"#);

        let progress = WorkerResponse::for_job("x", ResponseBody::Progress(Progress { stage: Stage::Placing, percent: 40 }));
        let json = r#"{"id":"x","type":"progress","payload":{"stage":"placing","percent":40}}"#;
        assert_eq!(serde_json::to_string(&progress).unwrap(), json);
        assert_eq!(serde_json::from_str::<WorkerResponse>(json).unwrap(), progress);

        let error = WorkerResponse::error("x", "internal", "boom");
        assert_eq!(serde_json::to_string(&error).unwrap(), r#"{"id":"x","type":"error","payload":{"code":"internal","message":"boom"}}"#);
    }

    #[tokio::test]
    async fn test_generation_task()
    {
        let mut task = GenerationTask::spawn(words(&["master", "steam", "meat", "tea"]), GeneratorSettings::default());
        let mut progress = task.progress().unwrap();
        assert!(task.progress().is_none());

        let outcome = task.join().await.unwrap();
        assert_eq!(outcome.total_words, 4);

        let mut updates = Vec::new();
        while let Some(update) = progress.recv().await
        {
            updates.push(update);
        }
        assert_eq!(updates.first().map(|p| p.stage), Some(Stage::Clustering));
        assert_eq!(updates.last(), Some(&Progress { stage: Stage::Done, percent: 100 }));
    }

    #[tokio::test]
    async fn test_generation_task_error()
    {
        let task = GenerationTask::spawn(words(&["123"]), GeneratorSettings::default());
        assert_eq!(task.join().await.unwrap_err(), GenerationError::GenerationFailed { words: 1 });
    }

    #[tokio::test]
    async fn test_generation_task_cancel()
    {
        let task = GenerationTask::spawn(many_words(), GeneratorSettings::default());
        task.cancel();

        assert_eq!(task.join().await.unwrap_err(), GenerationError::Cancelled);
    }

    #[tokio::test]
    async fn test_worker_runs_jobs()
    {
        let mut worker = spawn_worker();
        worker.send(WorkerRequest::generate("a", GeneratePayload { words: words(&["master", "steam", "tea"]), ..Default::default() })).await.unwrap();
        worker.send(WorkerRequest::generate("b", GeneratePayload { words: words(&["42"]), ..Default::default() })).await.unwrap();
        worker.close();
        assert_eq!(worker.send(WorkerRequest::cancel("a")).await, Err(WorkerError::Closed));

        let responses: Vec<WorkerResponse> = worker.collect().await;
        assert_eq!(responses[0], WorkerResponse::ready());
        assert_eq!(responses.iter().filter(|r| r.body == ResponseBody::Ready).count(), 1);

        let complete = responses.iter().find_map(|r| match &r.body { ResponseBody::Complete(outcome) => Some((r.id.as_deref(), outcome.placed_words)), _ => None });
        assert_eq!(complete, Some((Some("a"), 3)));

        let error = responses.iter().find_map(|r| match &r.body { ResponseBody::Error(report) => Some((r.id.as_deref(), report.code.as_str())), _ => None });
        assert_eq!(error, Some((Some("b"), "generation_failed")));
    }

    #[tokio::test]
    async fn test_worker_normalizes_payload_terms()
    {
        let json = r#"{"id": "lc", "type": "generate", "payload": {"words": [{"id": "1", "term": "Master"}, {"id": "2", "term": "steam!"}, {"id": "3", "term": "tea"}]}}"#;
        let mut worker = spawn_worker();
        worker.send(serde_json::from_str(json).unwrap()).await.unwrap();
        worker.close();

        let responses: Vec<WorkerResponse> = worker.collect().await;
        let Some(ResponseBody::Complete(outcome)) = responses.last().map(|r| &r.body) else { panic!("expected a complete response") };

        assert_eq!(outcome.placed_words, 3);
        let terms = outcome.puzzles[0].placed_words().iter().map(|w| w.term.as_str()).collect::<Vec<_>>();
        assert_eq!(terms, vec!["MASTER", "STEAM", "TEA"]);
    }

    #[tokio::test]
    async fn test_worker_cancels_running_job()
    {
        let mut worker = spawn_worker();
        worker.send(WorkerRequest::generate("slow", GeneratePayload { words: many_words(), ..Default::default() })).await.unwrap();
        worker.send(WorkerRequest::cancel("slow")).await.unwrap();
        worker.close();

        let responses: Vec<WorkerResponse> = worker.collect().await;
        assert_eq!(responses.last(), Some(&WorkerResponse::for_job("slow", ResponseBody::Cancelled)));
        assert!(!responses.iter().any(|r| matches!(r.body, ResponseBody::Complete(_))));
    }

    #[tokio::test]
    async fn test_worker_ignores_unknown_cancel()
    {
        let mut worker = spawn_worker();
        worker.send(WorkerRequest::cancel("nothing")).await.unwrap();
        worker.close();

        let responses: Vec<WorkerResponse> = worker.collect().await;
        assert_eq!(responses, vec![WorkerResponse::ready()]);
    }
}

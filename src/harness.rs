use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{Clock, Inventory};
use crate::limits::{JITTER_MAX_MS, JITTER_MIN_MS};
use crate::model::*;

/// One simulated customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    pub name: String,
    pub tickets: i64,
}

impl ClientSpec {
    pub fn new(name: impl Into<String>, tickets: i64) -> Self {
        Self {
            name: name.into(),
            tickets,
        }
    }
}

/// The demo line-up: 15 tickets asked of a 10-ticket inventory.
pub fn default_clients() -> Vec<ClientSpec> {
    vec![
        ClientSpec::new("Olena", 3),
        ClientSpec::new("Artem", 4),
        ClientSpec::new("Maria", 2),
        ClientSpec::new("Serhii", 5),
        ClientSpec::new("Natalia", 1),
    ]
}

// ── Pre-request delay ────────────────────────────────────────────

/// Pause a client takes before hitting the inventory.
#[async_trait]
pub trait PreRequestDelay: Send + Sync {
    async fn wait(&self, client: &str);
}

/// Fire immediately.
pub struct NoDelay;

#[async_trait]
impl PreRequestDelay for NoDelay {
    async fn wait(&self, _client: &str) {}
}

/// Uniform random pause in `[min, max)`.
pub struct RandomJitter {
    min_ms: u64,
    max_ms: u64,
}

impl RandomJitter {
    /// Callers must pass `min_ms < max_ms`; the public way in is `default`.
    fn new(min_ms: u64, max_ms: u64) -> Self {
        debug_assert!(min_ms < max_ms, "empty jitter range");
        Self { min_ms, max_ms }
    }

    fn sample(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..self.max_ms))
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new(JITTER_MIN_MS, JITTER_MAX_MS)
    }
}

#[async_trait]
impl PreRequestDelay for RandomJitter {
    async fn wait(&self, client: &str) {
        let pause = self.sample();
        debug!(client, ?pause, "client thinking");
        tokio::time::sleep(pause).await;
    }
}

// ── Task registry ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    Pending = 0,
    Running = 1,
    Done = 2,
}

impl TaskStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Pending,
            1 => TaskStatus::Running,
            _ => TaskStatus::Done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Done => "DONE",
        }
    }
}

/// Status cell one client task reports into.
pub struct TaskSlot {
    name: String,
    status: AtomicU8,
}

impl TaskSlot {
    fn new(name: String) -> Self {
        Self {
            name,
            status: AtomicU8::new(TaskStatus::Pending as u8),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Mark running; the returned guard marks done when dropped, panics included.
    fn enter(self: &Arc<Self>) -> RunningGuard {
        self.status.store(TaskStatus::Running as u8, Ordering::Release);
        RunningGuard(self.clone())
    }
}

struct RunningGuard(Arc<TaskSlot>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.status.store(TaskStatus::Done as u8, Ordering::Release);
    }
}

/// Read-only view over the client tasks, in registration order.
#[derive(Default)]
pub struct TaskRegistry {
    slots: Vec<Arc<TaskSlot>>,
}

impl TaskRegistry {
    fn register(&mut self, name: String) -> Arc<TaskSlot> {
        let slot = Arc::new(TaskSlot::new(name));
        self.slots.push(slot.clone());
        slot
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn snapshot(&self) -> Vec<(String, TaskStatus)> {
        self.slots
            .iter()
            .map(|s| (s.name().to_string(), s.status()))
            .collect()
    }

    /// `name:STATUS | name:STATUS | ...`
    pub fn render(&self) -> String {
        self.slots
            .iter()
            .map(|s| format!("{}:{}", s.name(), s.status().as_str()))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn all_done(&self) -> bool {
        self.slots.iter().all(|s| s.status() == TaskStatus::Done)
    }
}

// ── Result sink ──────────────────────────────────────────────────

/// Append-only collection of results, in completion order.
#[derive(Default)]
pub struct ResultSink {
    results: RwLock<Vec<BookingResult>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, result: BookingResult) {
        self.results.write().await.push(result);
    }

    pub async fn snapshot(&self) -> Vec<BookingResult> {
        self.results.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }
}

// ── Harness ──────────────────────────────────────────────────────

/// Spawns one task per client against a shared inventory and collects results.
pub struct Harness {
    inventory: Arc<Inventory>,
    clock: Arc<dyn Clock>,
    delay: Arc<dyn PreRequestDelay>,
    sink: Arc<ResultSink>,
    registry: Arc<TaskRegistry>,
    clients: Vec<(ClientSpec, Arc<TaskSlot>)>,
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Harness {
    pub fn new(
        inventory: Arc<Inventory>,
        clock: Arc<dyn Clock>,
        delay: Arc<dyn PreRequestDelay>,
        clients: Vec<ClientSpec>,
        cancel: CancellationToken,
    ) -> Self {
        let mut registry = TaskRegistry::default();
        let clients = clients
            .into_iter()
            .map(|spec| {
                let slot = registry.register(format!("client-{}", spec.name));
                (spec, slot)
            })
            .collect();
        Self {
            inventory,
            clock,
            delay,
            sink: Arc::new(ResultSink::new()),
            registry: Arc::new(registry),
            clients,
            handles: Vec::new(),
            cancel,
        }
    }

    pub fn registry(&self) -> Arc<TaskRegistry> {
        self.registry.clone()
    }

    pub fn sink(&self) -> Arc<ResultSink> {
        self.sink.clone()
    }

    /// Spawn every client not yet started.
    pub fn start(&mut self) {
        for (spec, slot) in self.clients.drain(..) {
            let task = run_client(
                spec,
                slot,
                self.inventory.clone(),
                self.clock.clone(),
                self.delay.clone(),
                self.sink.clone(),
                self.cancel.clone(),
            );
            self.handles.push(tokio::spawn(task));
        }
    }

    /// Wait for every spawned client and return the results in completion order.
    pub async fn join(self) -> Vec<BookingResult> {
        for joined in futures::future::join_all(self.handles).await {
            if let Err(e) = joined {
                tracing::error!("client task failed: {e}");
            }
        }
        self.sink.snapshot().await
    }
}

async fn run_client(
    spec: ClientSpec,
    slot: Arc<TaskSlot>,
    inventory: Arc<Inventory>,
    clock: Arc<dyn Clock>,
    delay: Arc<dyn PreRequestDelay>,
    sink: Arc<ResultSink>,
    cancel: CancellationToken,
) {
    let _running = slot.enter();

    let interrupted = tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = delay.wait(&spec.name) => false,
    };
    if interrupted {
        sink.push(BookingResult::failure(
            spec.name,
            spec.tickets,
            Outcome::Cancelled,
            "client interrupted while waiting",
        ))
        .await;
        return;
    }

    let request = BookingRequest::new(spec.name, spec.tickets);
    let result = inventory
        .book_tickets_cancellable(&request, clock.time_of_day(), &cancel)
        .await;
    sink.push(result).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FixedClock;
    use crate::limits::ACQUIRE_TIMEOUT;

    fn noon() -> Arc<dyn Clock> {
        Arc::new(FixedClock(TimeOfDay::from_hms_opt(12, 0, 0).unwrap()))
    }

    fn harness(capacity: u32, clients: Vec<ClientSpec>, delay: Arc<dyn PreRequestDelay>) -> Harness {
        let inventory = Arc::new(Inventory::new(capacity, ACQUIRE_TIMEOUT).unwrap());
        Harness::new(inventory, noon(), delay, clients, CancellationToken::new())
    }

    #[test]
    fn default_line_up_oversubscribes_ten() {
        let total: i64 = default_clients().iter().map(|c| c.tickets).sum();
        assert_eq!(total, 15);
    }

    #[test]
    fn jitter_stays_in_range() {
        let jitter = RandomJitter::default();
        for _ in 0..500 {
            let d = jitter.sample().as_millis() as u64;
            assert!((JITTER_MIN_MS..JITTER_MAX_MS).contains(&d), "{d}");
        }
    }

    #[test]
    fn narrow_jitter_hits_both_ends_and_never_max() {
        let jitter = RandomJitter::new(5, 7);
        let seen: std::collections::HashSet<u128> =
            (0..200).map(|_| jitter.sample().as_millis()).collect();
        assert_eq!(seen, [5, 6].into_iter().collect());
    }

    #[test]
    fn registry_starts_pending() {
        let h = harness(10, default_clients(), Arc::new(NoDelay));
        let registry = h.registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.snapshot().iter().all(|(_, s)| *s == TaskStatus::Pending));
        assert!(registry.render().starts_with("client-Olena:PENDING | client-Artem:PENDING"));
    }

    #[tokio::test]
    async fn every_client_reports_exactly_once() {
        let mut h = harness(10, default_clients(), Arc::new(NoDelay));
        let registry = h.registry();
        h.start();
        let results = h.join().await;

        assert_eq!(results.len(), 5);
        assert!(registry.all_done());
        let mut names: Vec<_> = results.iter().map(|r| r.client_name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["Artem", "Maria", "Natalia", "Olena", "Serhii"]);
    }

    #[tokio::test(start_paused = true)]
    async fn jittered_run_still_conserves_capacity() {
        let mut h = harness(10, default_clients(), Arc::new(RandomJitter::default()));
        let inventory = h.inventory.clone();
        h.start();
        let results = h.join().await;

        let issued: u32 = results.iter().map(|r| r.allocated().len() as u32).sum();
        assert!(issued <= 10);
        assert_eq!(inventory.remaining_capacity() + issued, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_delay_records_cancelled() {
        let cancel = CancellationToken::new();
        let inventory = Arc::new(Inventory::new(10, ACQUIRE_TIMEOUT).unwrap());
        let mut h = Harness::new(
            inventory.clone(),
            noon(),
            Arc::new(RandomJitter::new(1_000, 2_000)),
            vec![ClientSpec::new("Olena", 3)],
            cancel.clone(),
        );
        h.start();
        cancel.cancel();
        let results = h.join().await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome(), Outcome::Cancelled);
        assert_eq!(results[0].message(), "client interrupted while waiting");
        assert_eq!(inventory.remaining_capacity(), 10);
    }

    #[tokio::test]
    async fn sink_keeps_push_order() {
        let sink = ResultSink::new();
        sink.push(BookingResult::failure("a", 0, Outcome::ValidationError, "x")).await;
        sink.push(BookingResult::success("b", 1, vec![1])).await;
        let got = sink.snapshot().await;
        assert_eq!(sink.len().await, 2);
        assert_eq!(got[0].client_name(), "a");
        assert_eq!(got[1].client_name(), "b");
    }
}

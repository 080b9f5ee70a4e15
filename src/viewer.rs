//! Fetch lifecycle and derived views for the students table.
//!
//! [`RecordViewer`] owns the record collection and the loading state. The
//! terminal widget drives it: `begin_fetch` when mounted, `settle` when the
//! spawned read reports back. Everything here is synchronous and free of I/O
//! apart from [`fetch_students`].

use std::fmt;

use crate::{
    records::{
        GradeTone, SortOrder, StackFilter, StudentRecord, aggregate_score, grade_chip_label,
        grade_tone, sort_by_batch,
    },
    store::{DecodeError, RecordSource, StoreError, decode_students},
};

pub const NOTIFICATION_TITLE: &str = "Fetching Error";
pub const NO_DATA_MESSAGE: &str = "No data available.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Populated,
    Empty,
    TransportError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Store(StoreError),
    Decode(DecodeError),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Store(err) => write!(f, "{err}"),
            FetchError::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Store(err) => Some(err),
            FetchError::Decode(err) => Some(err),
        }
    }
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        FetchError::Store(err)
    }
}

impl From<DecodeError> for FetchError {
    fn from(err: DecodeError) -> Self {
        FetchError::Decode(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Records {
        records: Vec<StudentRecord>,
        size_bytes: usize,
    },
    NoData,
    Failed(FetchError),
}

/// Reads `path` once and classifies the answer.
pub async fn fetch_students(source: &dyn RecordSource, path: &str) -> FetchOutcome {
    let snapshot = match source.get(path).await {
        Ok(snapshot) => snapshot,
        Err(err) => return FetchOutcome::Failed(err.into()),
    };
    if !snapshot.exists() {
        return FetchOutcome::NoData;
    }
    match decode_students(snapshot.value()) {
        Ok(records) if records.is_empty() => FetchOutcome::NoData,
        Ok(records) => FetchOutcome::Records {
            records,
            size_bytes: snapshot.size_bytes(),
        },
        Err(err) => FetchOutcome::Failed(err.into()),
    }
}

/// Non-blocking message shown to the user when a fetch does not populate
/// the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    fn no_data() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            description: NO_DATA_MESSAGE.to_string(),
        }
    }

    fn failed(err: &FetchError) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            description: format!("Could not load students: {err}"),
        }
    }
}

/// Identifies one fetch. Results carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct RecordViewer {
    state: FetchState,
    records: Vec<StudentRecord>,
    size_bytes: usize,
    sort: SortOrder,
    stack_filter: StackFilter,
    fetch_seq: u64,
    closed: bool,
}

impl RecordViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Fetching)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_seq += 1;
        self.state = FetchState::Fetching;
        tracing::debug!(ticket = self.fetch_seq, "fetch_started");
        FetchTicket(self.fetch_seq)
    }

    /// Applies a finished fetch. Returns the notification to surface, if any.
    pub fn settle(&mut self, ticket: FetchTicket, outcome: FetchOutcome) -> Option<Notification> {
        if self.closed || ticket.0 != self.fetch_seq {
            tracing::debug!(
                ticket = ticket.0,
                current = self.fetch_seq,
                closed = self.closed,
                "dropping stale fetch result"
            );
            return None;
        }
        match outcome {
            FetchOutcome::Records {
                records,
                size_bytes,
            } => {
                tracing::info!(records = records.len(), size_bytes, "students_loaded");
                self.records = records;
                self.size_bytes = size_bytes;
                self.state = FetchState::Populated;
                None
            }
            FetchOutcome::NoData => {
                tracing::info!("no students at path");
                self.records.clear();
                self.size_bytes = 0;
                self.state = FetchState::Empty;
                Some(Notification::no_data())
            }
            FetchOutcome::Failed(err) => {
                tracing::error!(error = %err, "students_fetch_failed");
                let notification = Notification::failed(&err);
                self.records.clear();
                self.size_bytes = 0;
                self.state = FetchState::TransportError(err.to_string());
                Some(notification)
            }
        }
    }

    /// Marks the owner as torn down; any fetch still in flight is ignored.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn cycle_batch_sort(&mut self) -> SortOrder {
        self.sort = self.sort.next();
        self.sort
    }

    pub fn set_batch_sort(&mut self, order: SortOrder) {
        self.sort = order;
    }

    pub fn stack_filter(&self) -> &StackFilter {
        &self.stack_filter
    }

    pub fn set_stack_filter(&mut self, filter: StackFilter) {
        self.stack_filter = filter;
    }

    /// Rows as displayed: stack filter applied, then batch sort.
    pub fn rows(&self) -> Vec<&StudentRecord> {
        let mut rows: Vec<_> = self
            .records
            .iter()
            .filter(|record| self.stack_filter.matches(record))
            .collect();
        sort_by_batch(&mut rows, self.sort);
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeChip {
    pub label: String,
    pub score: i64,
    pub tone: GradeTone,
}

/// Everything the grade dialog shows for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeDetail {
    pub title: String,
    pub chips: Vec<GradeChip>,
    /// Raw sum of all period scores, not clamped to a percentage range.
    pub aggregate: i64,
}

impl GradeDetail {
    pub fn for_record(record: &StudentRecord) -> Self {
        let chips = record
            .grades
            .iter()
            .map(|(period, score)| GradeChip {
                label: grade_chip_label(period),
                score,
                tone: grade_tone(score),
            })
            .collect();
        Self {
            title: format!("Mentoring Grades - {}", record.name),
            chips,
            aggregate: aggregate_score(&record.grades),
        }
    }

    /// Gauge fill in 0..=100. The raw aggregate stays in `aggregate`.
    pub fn fill_percent(&self) -> u16 {
        self.aggregate.clamp(0, 100) as u16
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        records::{TagColor, certificate_tags, stack_tag},
        store::Snapshot,
    };

    struct FakeSource {
        answer: Mutex<Option<Result<Snapshot, StoreError>>>,
        paths: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(answer: Result<Snapshot, StoreError>) -> Self {
            Self {
                answer: Mutex::new(Some(answer)),
                paths: Mutex::new(Vec::new()),
            }
        }

        fn value(value: Value) -> Self {
            let size = value.to_string().len();
            Self::new(Ok(Snapshot::new(value, size)))
        }
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn get(&self, path: &str) -> Result<Snapshot, StoreError> {
            self.paths.lock().unwrap().push(path.to_string());
            self.answer
                .lock()
                .unwrap()
                .take()
                .expect("fake source read more than once")
        }
    }

    fn student(id: &str, batch: i64, stack: &str) -> Value {
        json!({
            "id": id,
            "name": format!("Student {id}"),
            "batch": batch,
            "stack": stack,
            "grades": {
                "w0102": 1, "w0304": 1, "week0506": 1,
                "week0708": 1, "week0910": 1, "week1112": 1
            },
            "certificates": {}
        })
    }

    async fn load(source: &FakeSource) -> (RecordViewer, Option<Notification>) {
        let mut viewer = RecordViewer::new();
        assert_eq!(viewer.state(), &FetchState::Idle);
        let ticket = viewer.begin_fetch();
        assert!(viewer.is_loading());
        let outcome = fetch_students(source, "students").await;
        let notification = viewer.settle(ticket, outcome);
        (viewer, notification)
    }

    #[tokio::test]
    async fn no_data_empties_and_notifies_once() {
        let source = FakeSource::value(Value::Null);
        let (mut viewer, notification) = load(&source).await;
        assert_eq!(viewer.state(), &FetchState::Empty);
        assert!(viewer.rows().is_empty());
        assert!(!viewer.is_loading());
        assert_eq!(
            notification,
            Some(Notification {
                title: "Fetching Error".to_string(),
                description: "No data available.".to_string(),
            })
        );
        assert_eq!(source.paths.lock().unwrap().as_slice(), ["students"]);

        // a duplicate delivery of the same result does not notify again
        let stale = FetchTicket(0);
        assert_eq!(viewer.settle(stale, FetchOutcome::NoData), None);
    }

    #[tokio::test]
    async fn transport_failure_is_its_own_state() {
        let source = FakeSource::new(Err(StoreError::Status {
            status: 401,
            body: "Permission denied".to_string(),
        }));
        let (viewer, notification) = load(&source).await;
        assert!(matches!(viewer.state(), FetchState::TransportError(_)));
        assert!(!viewer.is_loading());
        let notification = notification.unwrap();
        assert_eq!(notification.title, NOTIFICATION_TITLE);
        assert_ne!(notification.description, NO_DATA_MESSAGE);
        assert!(notification.description.contains("Permission denied"));
    }

    #[tokio::test]
    async fn decode_failure_is_a_transport_error() {
        let source = FakeSource::value(json!(42));
        let (viewer, notification) = load(&source).await;
        assert!(matches!(viewer.state(), FetchState::TransportError(_)));
        assert!(notification.is_some());
        assert!(viewer.records().is_empty());
    }

    #[tokio::test]
    async fn empty_collection_counts_as_no_data() {
        let source = FakeSource::value(json!([null, null]));
        let (viewer, notification) = load(&source).await;
        assert_eq!(viewer.state(), &FetchState::Empty);
        assert_eq!(notification.unwrap().description, NO_DATA_MESSAGE);
    }

    #[tokio::test]
    async fn one_malformed_record_keeps_the_rest() {
        let mut bad = student("b", 4, "LAMP");
        bad["grades"] = json!("none");
        let source = FakeSource::value(json!([student("a", 3, "MERN"), bad]));
        let (viewer, notification) = load(&source).await;
        assert_eq!(notification, None);
        assert_eq!(viewer.state(), &FetchState::Populated);
        let ids: Vec<_> = viewer.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn rows_sort_and_filter() {
        let source = FakeSource::value(json!([
            student("a", 12, "MERN"),
            student("b", 3, "LAMP"),
            student("c", 7, "MERN"),
            student("d", 1, "SERVERLESS"),
        ]));
        let (mut viewer, notification) = load(&source).await;
        assert_eq!(notification, None);
        assert_eq!(viewer.state(), &FetchState::Populated);
        assert_eq!(viewer.rows().len(), 4);

        assert_eq!(viewer.cycle_batch_sort(), SortOrder::Ascending);
        let batches: Vec<_> = viewer.rows().iter().map(|r| r.batch).collect();
        assert_eq!(batches, [1, 3, 7, 12]);

        viewer.set_stack_filter(["MERN"].into_iter().collect());
        let ids: Vec<_> = viewer.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "a"]);
        assert!(viewer.rows().iter().all(|r| r.stack.starts_with("MERN")));
    }

    #[test]
    fn stale_and_closed_results_are_ignored() {
        let mut viewer = RecordViewer::new();
        let first = viewer.begin_fetch();
        let second = viewer.begin_fetch();
        assert_eq!(viewer.settle(first, FetchOutcome::NoData), None);
        assert!(viewer.is_loading());

        viewer.close();
        assert_eq!(viewer.settle(second, FetchOutcome::NoData), None);
        assert!(viewer.is_loading());
    }

    #[test]
    fn grade_detail_for_120() {
        let record: StudentRecord = serde_json::from_value(json!({
            "id": "9",
            "name": "Krys",
            "batch": 2,
            "stack": "MEAN",
            "grades": {
                "w0102": 40, "w0304": 40, "week0506": 0,
                "week0708": 20, "week0910": 25, "week1112": -5
            }
        }))
        .unwrap();
        let detail = GradeDetail::for_record(&record);
        assert_eq!(detail.aggregate, 120);
        assert_eq!(detail.fill_percent(), 100);
        for chip in &detail.chips {
            let expected = if chip.score > 0 {
                GradeTone::Positive
            } else {
                GradeTone::Negative
            };
            assert_eq!(chip.tone, expected, "{}", chip.label);
        }
    }

    #[test]
    fn negative_aggregate_has_empty_fill() {
        let record: StudentRecord = serde_json::from_value(json!({
            "id": "9", "name": "Low", "batch": 2, "stack": "MEAN",
            "grades": { "w0102": -10 }
        }))
        .unwrap();
        let detail = GradeDetail::for_record(&record);
        assert_eq!(detail.aggregate, -10);
        assert_eq!(detail.fill_percent(), 0);
    }

    #[tokio::test]
    async fn ezra_end_to_end() {
        let source = FakeSource::value(json!([{
            "id": "1",
            "name": "Ezra",
            "batch": 3,
            "stack": "MERN",
            "grades": {
                "w0102": 10, "w0304": 20, "week0506": 0,
                "week0708": -5, "week0910": 15, "week1112": 5
            },
            "certificates": { "english": "B2" }
        }]));
        let (viewer, notification) = load(&source).await;
        assert_eq!(notification, None);

        let rows = viewer.rows();
        assert_eq!(rows.len(), 1);
        let row = rows[0];
        assert_eq!(row.batch, 3);
        assert_eq!(stack_tag(row).label, "MERN");

        let tags = certificate_tags(row);
        assert_eq!(tags[0].label, "B2");
        assert_eq!(tags[0].color, TagColor::Default);
        assert_eq!(tags[1].label, "Incompleted");
        assert_eq!(tags[1].color, TagColor::Volcano);
        assert_eq!(tags[2].label, "Incompleted");
        assert_eq!(tags[2].color, TagColor::Volcano);

        let detail = GradeDetail::for_record(row);
        assert_eq!(detail.title, "Mentoring Grades - Ezra");
        assert_eq!(detail.chips.len(), 6);
        let positive: Vec<_> = detail
            .chips
            .iter()
            .filter(|chip| chip.tone == GradeTone::Positive)
            .map(|chip| chip.score)
            .collect();
        assert_eq!(positive, [10, 20, 15, 5]);
        let negative: Vec<_> = detail
            .chips
            .iter()
            .filter(|chip| chip.tone == GradeTone::Negative)
            .map(|chip| chip.score)
            .collect();
        assert_eq!(negative, [0, -5]);
        assert_eq!(detail.aggregate, 45);
    }
}

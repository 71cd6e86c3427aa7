use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use shiftcheck_core::api::{ApiError, ApiResult, ChecklistApi, PhotoUpload};
use shiftcheck_core::{
    CalendarSummary, ChecklistError, ChecklistItem, ChecklistService, CompletionRecord, DayKey,
    DayState, EngineError, EnginePolicy, FilterState, Lang, LastCompletionIndex, LineStatus,
    PhotoRef, PreferenceStore, ScheduleEntry, Selector, SqlitePreferenceStore,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory stand-in for the checklist server.
#[derive(Default)]
struct FakeApi {
    items: Vec<ChecklistItem>,
    last_completions: LastCompletionIndex,
    days: Mutex<BTreeMap<String, DayState>>,
    schedules: Mutex<Vec<ScheduleEntry>>,
    submit_calls: Mutex<usize>,
    reject_submit: bool,
}

impl FakeApi {
    fn with_items(items: Vec<ChecklistItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    fn stored(&self, key: &str) -> Option<DayState> {
        self.days.lock().unwrap().get(key).cloned()
    }

    fn submit_calls(&self) -> usize {
        *self.submit_calls.lock().unwrap()
    }
}

#[async_trait]
impl ChecklistApi for FakeApi {
    async fn fetch_items(&self) -> ApiResult<Vec<ChecklistItem>> {
        Ok(self.items.clone())
    }

    async fn fetch_last_completions(&self) -> ApiResult<LastCompletionIndex> {
        Ok(self.last_completions.clone())
    }

    async fn fetch_day_state(&self, key: &DayKey) -> ApiResult<DayState> {
        Ok(self.stored(&key.to_string()).unwrap_or_default())
    }

    async fn submit_day_state(
        &self,
        key: &DayKey,
        _items: &[ChecklistItem],
        state: &DayState,
    ) -> ApiResult<()> {
        *self.submit_calls.lock().unwrap() += 1;
        if self.reject_submit {
            return Err(ApiError::Rejected("quota exceeded".to_string()));
        }
        self.days
            .lock()
            .unwrap()
            .insert(key.to_string(), state.clone());
        Ok(())
    }

    async fn upload_photo(&self, upload: &PhotoUpload) -> ApiResult<PhotoRef> {
        Ok(PhotoRef {
            url: format!("https://storage.example/{}/{}", upload.day_key, upload.filename),
            filename: upload.filename.clone(),
            uploaded_at: None,
        })
    }

    async fn fetch_schedule(&self, date: NaiveDate, line: &str) -> ApiResult<Option<ScheduleEntry>> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.date == date && entry.line == line)
            .cloned())
    }

    async fn save_schedule(&self, entry: &ScheduleEntry) -> ApiResult<()> {
        self.schedules.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn fetch_calendar_summary(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> ApiResult<CalendarSummary> {
        Ok(CalendarSummary {
            total_master_items: self.items.len(),
            ..CalendarSummary::default()
        })
    }

    async fn health(&self) -> ApiResult<String> {
        Ok("ok".to_string())
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
}

fn catalog() -> Vec<ChecklistItem> {
    let mut daily = ChecklistItem::new("item_1", "램프 점검");
    daily.period_days = Some(1);
    daily.item_en = Some("Check lamp".to_string());
    let mut weekly = ChecklistItem::new("item_2", "레일 그리스");
    weekly.period_days = Some(7);
    vec![daily, weekly]
}

fn service_for(api: FakeApi) -> ChecklistService<FakeApi, SqlitePreferenceStore> {
    let prefs = SqlitePreferenceStore::in_memory().unwrap();
    ChecklistService::new(api, prefs, day(), EnginePolicy::default()).unwrap()
}

#[tokio::test]
async fn load_rejects_empty_catalog() {
    let mut service = service_for(FakeApi::default());
    let err = service.load().await.unwrap_err();
    assert!(matches!(err, ChecklistError::Engine(EngineError::EmptyCatalog)));
}

#[tokio::test]
async fn toggle_and_submit_persist_the_day_state() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.set_user("kim").unwrap();
    service.load().await.unwrap();

    assert!(service.toggle("item_1", Some("ok".to_string())).unwrap());
    service.submit().await.unwrap();

    let stored = service.api().stored("2024-01-08_Line1").unwrap();
    assert_eq!(
        stored.record("item_1", "kim").unwrap().note.as_deref(),
        Some("ok")
    );
    assert!(service.engine().state().is_checked_by("item_1", "kim"));

    let stats = service.stats(day());
    assert_eq!((stats.total, stats.checked, stats.progress), (2, 1, 50));
}

#[tokio::test]
async fn submit_without_user_fails_before_any_request() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.load().await.unwrap();

    let err = service.submit().await.unwrap_err();
    assert!(matches!(err, ChecklistError::Engine(EngineError::MissingUser)));
    assert_eq!(service.api().submit_calls(), 0);
}

#[tokio::test]
async fn rejected_submit_surfaces_server_message() {
    let api = FakeApi {
        reject_submit: true,
        ..FakeApi::with_items(catalog())
    };
    let mut service = service_for(api);
    service.set_user("kim").unwrap();
    service.load().await.unwrap();
    service.toggle("item_1", None).unwrap();

    let err = service.submit().await.unwrap_err();
    assert!(matches!(
        err,
        ChecklistError::Api(ApiError::Rejected(ref message)) if message == "quota exceeded"
    ));
    assert!(service.engine().state().is_checked_by("item_1", "kim"));
}

#[tokio::test]
async fn edit_note_submits_immediately() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.set_user("kim").unwrap();
    service.load().await.unwrap();

    let err = service.edit_note("item_1", "late").await.unwrap_err();
    assert!(matches!(
        err,
        ChecklistError::Engine(EngineError::NotChecked { .. })
    ));
    assert_eq!(service.api().submit_calls(), 0);

    service.toggle("item_1", None).unwrap();
    service.edit_note("item_1", "late").await.unwrap();
    assert_eq!(service.api().submit_calls(), 1);
    let stored = service.api().stored("2024-01-08_Line1").unwrap();
    assert_eq!(
        stored.record("item_1", "kim").unwrap().note.as_deref(),
        Some("late")
    );
}

#[tokio::test]
async fn upload_photo_attaches_reference_locally() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.set_user("kim").unwrap();
    service.load().await.unwrap();

    let err = service
        .upload_photo("item_9", "a.jpg", vec![1, 2, 3], "image/jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, ChecklistError::Engine(EngineError::UnknownItem(_))));

    let photo = service
        .upload_photo("item_2", "rail.jpg", vec![1, 2, 3], "image/jpeg")
        .await
        .unwrap();
    assert_eq!(photo.url, "https://storage.example/2024-01-08_Line1/rail.jpg");
    assert_eq!(
        service.engine().state().photos_for("item_2"),
        vec![&photo]
    );
}

#[tokio::test]
async fn export_reads_fresh_state_from_server() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.set_user("kim").unwrap();
    service.load().await.unwrap();
    service.toggle("item_2", None).unwrap();

    let unsaved = service.export_csv().await.unwrap();
    assert_eq!(unsaved.file_name, "checklist_checked_2024-01-08_Line1.csv");
    let text = String::from_utf8(unsaved.bytes).unwrap();
    assert_eq!(text.lines().count(), 1);

    service.submit().await.unwrap();
    let saved = service.export_csv().await.unwrap();
    let text = String::from_utf8(saved.bytes).unwrap();
    assert!(text.contains("item_2,\"레일 그리스\",Line1,kim,true,"));
}

#[tokio::test]
async fn context_changes_are_persisted() {
    let mut service = service_for(FakeApi::with_items(catalog()));
    service.set_user("  park ").unwrap();
    service.set_line("Line2").unwrap();
    service.set_lang(Lang::En).unwrap();
    assert!(service.set_line("Line2?date=x").is_err());

    let context = service.context();
    assert_eq!(context.user, "park");
    assert_eq!(context.line, "Line2");
    assert_eq!(context.day_key().to_string(), "2024-01-08_Line2");
}

#[tokio::test]
async fn preferences_seed_a_new_session() {
    let prefs = SqlitePreferenceStore::in_memory().unwrap();
    prefs.set("checklist_user", "lee").unwrap();
    prefs.set("checklist_lang", "en").unwrap();

    let service = ChecklistService::new(
        FakeApi::with_items(catalog()),
        prefs,
        day(),
        EnginePolicy::default(),
    )
    .unwrap();
    assert_eq!(service.context().user, "lee");
    assert_eq!(service.context().line, "Line1");
    assert_eq!(service.context().lang, Lang::En);
}

#[tokio::test]
async fn schedule_round_trip_stamps_editor() {
    let mut service = service_for(FakeApi::with_items(catalog()));

    let empty = service.fetch_schedule().await.unwrap();
    assert_eq!(empty.status, LineStatus::Running);
    assert!(matches!(
        service.save_schedule(empty.clone()).await.unwrap_err(),
        ChecklistError::Engine(EngineError::MissingUser)
    ));

    service.set_user("kim").unwrap();
    let mut entry = empty;
    entry.status = LineStatus::Maintenance;
    entry.notes = "roller swap".to_string();
    let saved = service.save_schedule(entry).await.unwrap();
    assert_eq!(saved.updated_by, "kim");
    assert!(saved.updated_at.is_some());

    let fetched = service.fetch_schedule().await.unwrap();
    assert_eq!(fetched.status, LineStatus::Maintenance);
    assert_eq!(fetched.line, "Line1");
}

#[tokio::test]
async fn calendar_summary_rejects_reversed_range() {
    let service = service_for(FakeApi::with_items(catalog()));
    let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let err = service.calendar_summary(start, end).await.unwrap_err();
    assert!(matches!(err, ChecklistError::InvalidRange { .. }));

    let summary = service.calendar_summary(end, start).await.unwrap();
    assert_eq!(summary.total_master_items, 2);
}

fn electrode_catalog() -> Vec<ChecklistItem> {
    ["Anode", "Cathode"]
        .iter()
        .enumerate()
        .map(|(index, equipment)| {
            let mut item = ChecklistItem::new(format!("item_{}", index + 1), *equipment);
            item.equipment = Some(equipment.to_string());
            item.period_days = Some(1);
            item
        })
        .collect()
}

#[tokio::test]
async fn mistyped_filter_is_an_error_not_a_full_list() {
    let mut service = service_for(FakeApi::with_items(electrode_catalog()));
    service.load().await.unwrap();

    let err = service
        .set_filters(FilterState {
            equipment: Selector::Only("Anod".to_string()),
            ..FilterState::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ChecklistError::UnknownFilter { selector: "equipment", ref value } if value == "Anod"
    ));
    assert_eq!(service.filters(), &FilterState::default());

    service
        .set_filters(FilterState {
            equipment: Selector::Only("Anode".to_string()),
            ..FilterState::default()
        })
        .unwrap();
    let visible: Vec<&str> = service
        .visible_items(day())
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert_eq!(visible, vec!["item_1"]);
}

#[tokio::test]
async fn filters_set_before_load_are_reconciled_on_load() {
    let mut service = service_for(FakeApi::with_items(electrode_catalog()));
    service
        .set_filters(FilterState {
            equipment: Selector::Only("Separator".to_string()),
            ..FilterState::default()
        })
        .unwrap();

    service.load().await.unwrap();
    assert!(service.filters().is_unrestricted());
}

#[tokio::test]
async fn day_summary_counts_due_and_checked_items() {
    let mut last = LastCompletionIndex::new();
    last.insert(
        "item_2".to_string(),
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
    );
    let api = FakeApi {
        last_completions: last,
        ..FakeApi::with_items(catalog())
    };
    let mut service = service_for(api);
    service.set_user("kim").unwrap();
    service.load().await.unwrap();

    let empty = service.day_summary();
    assert!(!empty.submitted);
    assert_eq!((empty.total_due, empty.total_checked), (1, 0));
    assert_eq!(empty.period_due_counts.get("7"), None);

    service.toggle("item_1", None).unwrap();
    let summary = service.day_summary();
    assert!(summary.submitted);
    assert_eq!(summary.total_checked, 1);
    assert_eq!(summary.users["kim"], 1);
    assert_eq!(summary.period_checks["1"], 1);
}

#[tokio::test]
async fn local_calendar_summary_reads_each_day_of_the_line() {
    let api = FakeApi::with_items(catalog());
    let mut stored = DayState::default();
    stored.checked.entry("item_2".to_string()).or_default().insert(
        "lee".to_string(),
        CompletionRecord::checked_at(Utc.with_ymd_and_hms(2024, 1, 7, 8, 0, 0).unwrap(), None),
    );
    api.days
        .lock()
        .unwrap()
        .insert("2024-01-07_Line1".to_string(), stored);
    let mut service = service_for(api);

    let start = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
    let err = service.local_calendar_summary(start, day()).await.unwrap_err();
    assert!(matches!(err, ChecklistError::Engine(EngineError::EmptyCatalog)));

    service.load().await.unwrap();
    let summary = service.local_calendar_summary(start, day()).await.unwrap();
    assert_eq!(summary.total_master_items, 2);
    assert_eq!(summary.summary_data.len(), 3);
    assert!(!summary.summary_data["2024-01-06"].submitted);
    let busy = &summary.summary_data["2024-01-07"];
    assert!(busy.submitted);
    assert_eq!(busy.users["lee"], 1);
    assert_eq!(busy.period_checks["7"], 1);

    let err = service
        .local_calendar_summary(day(), start)
        .await
        .unwrap_err();
    assert!(matches!(err, ChecklistError::InvalidRange { .. }));
}

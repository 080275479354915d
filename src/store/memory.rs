// src/store/memory.rs
//! In-memory store backing tests and local dry runs. Implements all three
//! collaborator contracts behind one mutex; locks are never held across an
//! await point.

use crate::error::HarvestError;
use crate::store::{PostStore, SessionLog, TaskStore};
use crate::types::{DailyTask, ExtractedKeyword, SessionRecord, StoredPost, TaskStatus};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    posts: Vec<StoredPost>,
    keywords: HashMap<String, Vec<ExtractedKeyword>>,
    tasks: HashMap<NaiveDate, DailyTask>,
    sessions: Vec<SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<StoredPost> {
        self.inner.lock().expect("memory store poisoned").posts.clone()
    }

    pub fn keywords_for(&self, item_id: &str) -> Vec<ExtractedKeyword> {
        self.inner
            .lock()
            .expect("memory store poisoned")
            .keywords
            .get(item_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.inner.lock().expect("memory store poisoned").sessions.clone()
    }

    /// Test helper: pre-seed a day's task in a given state.
    pub fn put_task(&self, task: DailyTask) {
        self.inner
            .lock()
            .expect("memory store poisoned")
            .tasks
            .insert(task.date, task);
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryStore {
    async fn exists_today(&self, item_id: &str, date: NaiveDate) -> Result<bool, HarvestError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .posts
            .iter()
            .any(|p| p.item.id == item_id && p.collected_on == date))
    }

    async fn insert(&self, post: &StoredPost) -> Result<bool, HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let conflict = inner
            .posts
            .iter()
            .any(|p| p.item.id == post.item.id && p.collected_on == post.collected_on);
        if conflict {
            return Ok(false);
        }
        inner.posts.push(post.clone());
        Ok(true)
    }

    async fn insert_keywords(
        &self,
        item_id: &str,
        keywords: &[ExtractedKeyword],
    ) -> Result<u32, HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let entry = inner.keywords.entry(item_id.to_string()).or_default();
        entry.extend_from_slice(keywords);
        Ok(keywords.len() as u32)
    }

    async fn count_today(&self, date: NaiveDate) -> Result<u32, HarvestError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.posts.iter().filter(|p| p.collected_on == date).count() as u32)
    }

    async fn count_today_by_source(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<String, u32>, HarvestError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        let mut stats: HashMap<String, u32> = HashMap::new();
        for p in inner.posts.iter().filter(|p| p.collected_on == date) {
            *stats.entry(p.source.clone()).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryStore {
    async fn create_if_absent(&self, date: NaiveDate, target: u32) -> Result<(), HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner
            .tasks
            .entry(date)
            .or_insert_with(|| DailyTask::new(date, target));
        Ok(())
    }

    async fn try_start(&self, date: NaiveDate) -> Result<bool, HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let task = inner
            .tasks
            .get_mut(&date)
            .ok_or_else(|| HarvestError::storage(format!("no task row for {date}")))?;
        match task.status {
            TaskStatus::Pending | TaskStatus::Failed => {
                task.status = TaskStatus::Running;
                task.started_at = Some(Utc::now().timestamp());
                task.error_message = None;
                Ok(true)
            }
            TaskStatus::Running | TaskStatus::Completed => Ok(false),
        }
    }

    async fn finish(
        &self,
        date: NaiveDate,
        status: TaskStatus,
        actual_count: u32,
        error_message: Option<String>,
    ) -> Result<(), HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let task = inner
            .tasks
            .get_mut(&date)
            .ok_or_else(|| HarvestError::storage(format!("no task row for {date}")))?;
        task.status = status;
        task.actual_count = actual_count;
        task.ended_at = Some(Utc::now().timestamp());
        task.error_message = error_message;
        Ok(())
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<DailyTask>, HarvestError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.tasks.get(&date).cloned())
    }
}

#[async_trait::async_trait]
impl SessionLog for MemoryStore {
    async fn record(&self, session: &SessionRecord) -> Result<(), HarvestError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.sessions.push(session.clone());
        Ok(())
    }
}

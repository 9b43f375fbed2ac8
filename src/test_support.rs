//! In-memory repository and push client doubles.
//!
//! Unit tests use them directly; integration tests reach them through the
//! `test-support` feature so there is a single set to keep in line with the
//! PostgreSQL repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::expense::Expense;
use crate::models::push::{PushPayload, PushSubscription};
use crate::models::reminder::Reminder;
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::push_subscription_repository::PushSubscriptionRepository;
use crate::repositories::reminder_repository::ReminderRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::RepositoryError;
use crate::services::push_client::{DeliveryError, PushClient};

fn db_down() -> RepositoryError {
    RepositoryError::DatabaseError("Database connection failed".to_string())
}

pub struct MockUserRepository {
    users: Mutex<HashMap<String, User>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(
        &self,
        user: CreateUserRequest,
        password_hash: String,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let email = user.email.to_lowercase();

        if users.contains_key(&email) {
            return Err(RepositoryError::ConstraintViolation(
                "Email already exists".to_string(),
            ));
        }

        let new_user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_hash,
            created_at: Utc::now(),
        };

        users.insert(new_user.email.clone(), new_user.clone());
        Ok(new_user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&email.to_lowercase()).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}

pub struct MockCategoryRepository {
    categories: Mutex<Vec<Category>>,
    pub should_fail: bool,
}

impl MockCategoryRepository {
    /// Starts empty so `ensure_defaults` has something to do
    pub fn new() -> Self {
        Self {
            categories: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            categories: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }
}

#[async_trait]
impl CategoryRepository for MockCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        let categories = self.categories.lock().unwrap();
        Ok(categories.iter().find(|c| c.id == id).cloned())
    }

    async fn ensure_defaults(&self) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        let mut categories = self.categories.lock().unwrap();
        for category in Category::defaults() {
            if !categories.iter().any(|c| c.id == category.id) {
                categories.push(category);
            }
        }
        Ok(())
    }
}

pub struct MockExpenseRepository {
    expenses: Mutex<Vec<Expense>>,
    pub should_fail: bool,
}

impl MockExpenseRepository {
    pub fn new() -> Self {
        Self {
            expenses: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            expenses: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }
}

#[async_trait]
impl ExpenseRepository for MockExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        self.expenses.lock().unwrap().push(expense.clone());
        Ok(expense)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        let mut expenses: Vec<Expense> = self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }
}

pub struct MockReminderRepository {
    reminders: Mutex<HashMap<Uuid, Reminder>>,
    /// Reminder ids whose due-date update should fail
    pub failing_updates: Mutex<HashSet<Uuid>>,
    /// Due dates another writer sets just before the next guarded update
    interference: Mutex<HashMap<Uuid, VecDeque<DateTime<Utc>>>>,
    pub fail_queries: bool,
}

impl MockReminderRepository {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(HashMap::new()),
            failing_updates: Mutex::new(HashSet::new()),
            interference: Mutex::new(HashMap::new()),
            fail_queries: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            fail_queries: true,
            ..Self::new()
        }
    }

    pub fn insert(&self, reminder: Reminder) {
        self.reminders.lock().unwrap().insert(reminder.id, reminder);
    }

    pub fn get(&self, id: Uuid) -> Option<Reminder> {
        self.reminders.lock().unwrap().get(&id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.lock().unwrap().is_empty()
    }

    pub fn fail_update_for(&self, id: Uuid) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    /// Queues a concurrent write: the next guarded update of `id` first sees
    /// the row moved to `next_due_date`. Calls stack, one per update.
    pub fn interfere_once(&self, id: Uuid, next_due_date: DateTime<Utc>) {
        self.interference
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .push_back(next_due_date);
    }
}

#[async_trait]
impl ReminderRepository for MockReminderRepository {
    async fn create(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        if self.fail_queries {
            return Err(db_down());
        }
        self.insert(reminder.clone());
        Ok(reminder)
    }

    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Reminder>, RepositoryError> {
        if self.fail_queries {
            return Err(db_down());
        }
        Ok(self.get(id).filter(|r| r.user_id == user_id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, RepositoryError> {
        if self.fail_queries {
            return Err(db_down());
        }
        let mut reminders: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by(|a, b| a.next_due_date.cmp(&b.next_due_date));
        Ok(reminders)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, RepositoryError> {
        if self.fail_queries {
            return Err(db_down());
        }
        let mut reminders: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_active && r.next_due_date <= now)
            .cloned()
            .collect();
        reminders.sort_by(|a, b| a.next_due_date.cmp(&b.next_due_date));
        Ok(reminders)
    }

    async fn update_next_due_date(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        next_due_date: DateTime<Utc>,
    ) -> Result<Option<Reminder>, RepositoryError> {
        if self.fail_queries || self.failing_updates.lock().unwrap().contains(&id) {
            return Err(db_down());
        }
        let concurrent = self
            .interference
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(|queue| queue.pop_front());

        let mut reminders = self.reminders.lock().unwrap();
        let Some(reminder) = reminders.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(moved) = concurrent {
            reminder.next_due_date = moved;
        }
        if reminder.next_due_date != expected {
            return Ok(None);
        }
        reminder.next_due_date = next_due_date;
        Ok(Some(reminder.clone()))
    }
}

pub struct MockPushSubscriptionRepository {
    subscriptions: Mutex<Vec<PushSubscription>>,
    pub should_fail: bool,
}

impl MockPushSubscriptionRepository {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.endpoint.clone())
            .collect()
    }

    pub fn count_for(&self, user_id: Uuid) -> usize {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl PushSubscriptionRepository for MockPushSubscriptionRepository {
    async fn upsert(
        &self,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions
            .iter_mut()
            .find(|s| s.user_id == user_id && s.endpoint == endpoint)
        {
            existing.p256dh = p256dh.to_string();
            existing.auth = auth.to_string();
            return Ok(existing.clone());
        }

        let subscription = PushSubscription {
            user_id,
            endpoint: endpoint.to_string(),
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
            created_at: Utc::now(),
        };
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<PushSubscription>, RepositoryError> {
        if self.should_fail {
            return Err(db_down());
        }
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, user_id: Uuid, endpoint: &str) -> Result<(), RepositoryError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| !(s.user_id == user_id && s.endpoint == endpoint));
        if subscriptions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.user_id != user_id);
        Ok((before - subscriptions.len()) as u64)
    }
}

/// Records every delivery; endpoints can be scripted to fail or be gone
pub struct MockPushClient {
    delivered: Mutex<Vec<(String, PushPayload)>>,
    failing: Mutex<HashSet<String>>,
    gone: Mutex<HashSet<String>>,
}

impl MockPushClient {
    pub fn new() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            gone: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_endpoint(&self, endpoint: &str) {
        self.failing.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn gone_endpoint(&self, endpoint: &str) {
        self.gone.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn delivered(&self) -> Vec<(String, PushPayload)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushClient for MockPushClient {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        if self.gone.lock().unwrap().contains(&subscription.endpoint) {
            return Err(DeliveryError::Gone);
        }
        if self.failing.lock().unwrap().contains(&subscription.endpoint) {
            return Err(DeliveryError::Failed("502 Bad Gateway".to_string()));
        }
        let payload: PushPayload = serde_json::from_slice(payload)
            .map_err(|e| DeliveryError::Failed(e.to_string()))?;
        self.delivered
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload));
        Ok(())
    }
}

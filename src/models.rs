pub mod auth;
pub mod category;
pub mod expense;
pub mod push;
pub mod reminder;
pub mod user;

pub use auth::{AuthToken, LoginRequest};
pub use category::{Category, DEFAULT_CATEGORIES, FALLBACK_CATEGORY_ID};
pub use expense::{CreateExpenseRequest, Expense};
pub use push::{
    PushPayload, PushSubscription, SubscribeRequest, SubscriptionKeys, TestNotificationRequest,
};
pub use reminder::{CreateReminderRequest, Frequency, Reminder};
pub use user::{CreateUserRequest, User};

pub mod auth_service;
pub mod category_service;
pub mod due_date;
pub mod expense_service;
pub mod notification_service;
pub mod push_client;
pub mod reminder_checker;
pub mod reminder_service;

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use expense_reminders::app::{build_router, AppState};
use expense_reminders::config::Config;
use expense_reminders::logging::setup_logging;
use expense_reminders::repositories::category_repository::{
    CategoryRepository, PostgresCategoryRepository,
};
use expense_reminders::repositories::expense_repository::PostgresExpenseRepository;
use expense_reminders::repositories::push_subscription_repository::PostgresPushSubscriptionRepository;
use expense_reminders::repositories::reminder_repository::PostgresReminderRepository;
use expense_reminders::repositories::user_repository::PostgresUserRepository;
use expense_reminders::scheduler::ReminderScheduler;
use expense_reminders::services::auth_service::AuthServiceImpl;
use expense_reminders::services::category_service::CategoryServiceImpl;
use expense_reminders::services::expense_service::ExpenseServiceImpl;
use expense_reminders::services::notification_service::NotificationServiceImpl;
use expense_reminders::services::push_client::{DisabledPushClient, PushClient, VapidPushClient};
use expense_reminders::services::reminder_checker::ReminderChecker;
use expense_reminders::services::reminder_service::ReminderServiceImpl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    setup_logging(config.log_dir.as_deref());

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed");

    // Initialize repositories
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool.clone()));
    let reminder_repository = Arc::new(PostgresReminderRepository::new(pool.clone()));
    let subscription_repository = Arc::new(PostgresPushSubscriptionRepository::new(pool.clone()));

    category_repository.ensure_defaults().await?;

    let push_client: Arc<dyn PushClient> = match &config.vapid_private_key_pem {
        Some(pem) => Arc::new(VapidPushClient::new(
            pem.clone(),
            config.vapid_subject.clone(),
        )?),
        None => {
            tracing::warn!("VAPID_PRIVATE_KEY_PEM not set, push notifications are disabled");
            Arc::new(DisabledPushClient)
        }
    };

    // Initialize services
    let category_service = Arc::new(CategoryServiceImpl::new(category_repository));
    let notification_service = Arc::new(NotificationServiceImpl::new(
        subscription_repository,
        push_client,
        config.vapid_public_key.clone(),
    ));
    let checker = Arc::new(ReminderChecker::new(
        reminder_repository.clone(),
        notification_service.clone(),
    ));
    let scheduler = ReminderScheduler::new(
        checker,
        config.reminder_check_interval,
        config.reminder_initial_delay,
    );

    let state = AppState {
        auth_service: Arc::new(AuthServiceImpl::new(
            user_repository,
            config.jwt_secret.clone(),
        )),
        expense_service: Arc::new(ExpenseServiceImpl::new(
            expense_repository,
            category_service.clone(),
        )),
        category_service,
        reminder_service: Arc::new(ReminderServiceImpl::new(reminder_repository)),
        notification_service,
        scheduler: scheduler.clone(),
    };

    scheduler.start().await;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("API docs at http://{}/api/docs", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    tracing::info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

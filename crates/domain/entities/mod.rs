pub mod payment_transactions;
pub mod subscription_orders;
pub mod subscriptions;
pub mod user_subscriptions;
pub mod users;

pub mod payment_transactions;
pub mod resource_counts;
pub mod subscription_orders;
pub mod subscriptions;
pub mod user_subscriptions;
pub mod users;

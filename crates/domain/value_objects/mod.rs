pub mod entitlements;
pub mod enums;
pub mod payment_transactions;
pub mod subscription_orders;
pub mod subscriptions;

pub mod entitlements;
pub mod errors;
pub mod payments;
pub mod subscription_catalog;
pub mod subscription_orders;
pub mod webhook_reconciler;

pub mod entitlements;
pub mod orders;
pub mod payment_methods;
pub mod payments;
pub mod subscriptions;

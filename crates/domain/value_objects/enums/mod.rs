pub mod capabilities;
pub mod order_statuses;
pub mod transaction_statuses;
pub mod user_roles;

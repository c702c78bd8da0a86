pub mod method_registry;
pub mod midtrans_client;
pub mod notifications;

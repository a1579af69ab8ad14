//! Domain layer: value types, payment records and the ports through which
//! the application reaches wallets, token contracts and the encryption
//! service.

pub mod amount;
pub mod payment;
pub mod ports;
pub mod types;

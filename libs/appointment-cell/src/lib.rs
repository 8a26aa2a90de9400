pub mod handlers;
pub mod ledger;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod store;

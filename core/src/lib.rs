pub mod catalog;
pub mod db;
pub mod error;
pub mod ledger;
pub mod limits;
pub mod models;
pub mod plans;
pub mod selection;
pub mod service;
pub mod session;
pub mod store;

pub use error::{Mutation, SugarError, WriteOutcome};
pub use service::SugarService;

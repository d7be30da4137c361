pub mod experiment;
pub mod state_store;

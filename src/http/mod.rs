//! HTTP access to the remote test-automation service

mod api;
mod client;

pub use api::{
    ApiResponse, Endpoint, ExecutionApi, ServiceClient, StatusSnapshot,
    TriggerReceipt,
};

// src/lib.rs

//! regbook: register book enumeration library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod utils;

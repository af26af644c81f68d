pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod migration;
pub mod model;
pub mod models;
pub mod payroll;
pub mod routes;

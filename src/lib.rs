pub mod common;
pub mod config;
pub mod routes;
pub mod schemes;
pub mod services;
pub mod session;
pub mod workbooks;

#[cfg(test)]
pub mod test_helpers;

pub mod models;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

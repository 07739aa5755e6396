pub mod client;
pub mod locator;
pub mod markers;
pub mod parse;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

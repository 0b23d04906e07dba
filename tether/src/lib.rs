pub mod feed;
pub mod interceptor;
pub mod liveness;
pub mod platform;
pub mod run;
pub mod sampler;
pub mod supervisor;
pub mod version;

pub use supervisor::{Host, StartError, Supervisor};

#[cfg(test)]
mod tests;

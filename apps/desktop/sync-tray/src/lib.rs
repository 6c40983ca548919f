// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod launch;
pub mod logger;
pub mod reporter;

#[cfg(test)]
mod tests;

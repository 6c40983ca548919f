mod engine;
mod polling;
mod protocol;

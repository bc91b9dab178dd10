pub mod calendar;
pub mod engine;
pub mod matcher;
pub mod materializer;
pub mod resolver;

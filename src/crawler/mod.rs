pub mod crawler;
pub mod fetcher;
pub mod normalize;
pub mod parser;
pub mod queue;
pub mod quiescence;
pub mod resource;
pub mod robots;
pub mod throttle;
pub mod worker;

pub use crawler::Crawler;
pub use resource::Resource;
pub use worker::{Status, Worker};

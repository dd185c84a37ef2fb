pub mod client;
pub mod parser;
pub mod resolver;
pub mod types;

pub use client::ArxivClient;
pub use resolver::ArxivLinkResolver;
pub use types::{ArxivEntry, ArxivFeed};

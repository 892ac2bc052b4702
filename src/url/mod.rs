//! URL helpers shared by the job service and the link classifier
//!
//! - `normalize_target`: turns user input into a crawlable absolute URL
//! - `host_key` / `same_host`: the exact host comparison used to decide whether a
//!   link is internal to the crawled page

mod domain;
mod normalize;

pub use domain::{host_key, same_host};
pub use normalize::normalize_target;

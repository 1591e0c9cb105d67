pub mod api;
pub mod classifier;
pub mod error;
pub mod resolver;
pub mod value;
mod coercer;
mod loader;
mod template;

pub use api::{load, load_required, load_source, load_with_context, LoadResult};
pub use loader::PRIVATE_PREFIX;
pub use value::{Environment, Value};

mod context;

pub use context::{ActiveContext, ContextBuilder, TypedContextBuilder};

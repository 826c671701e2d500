pub mod context_builder;
pub mod retriever;

pub mod extract;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod registry;

pub mod activity_aggregation;
pub mod git_platforms;
pub mod summary_builder;
pub mod wrapped_job;
pub mod wrapped_renderer;

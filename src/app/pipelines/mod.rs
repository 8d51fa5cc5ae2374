pub mod usom_pipeline;

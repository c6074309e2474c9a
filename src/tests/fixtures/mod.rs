pub mod app;
pub mod sample_task;

pub mod emitter;
pub mod file_writer;
pub mod tracing_writer;

pub use emitter::{spawn_retention_task, QueryLogEmitter};
pub use file_writer::FileQueryLogWriter;
pub use tracing_writer::TracingQueryLogWriter;

pub mod operation_reader;
pub mod profile_writer;

pub use operation_reader::{Operation, OperationReader, OperationType};
pub use profile_writer::ProfileWriter;

pub mod convert;
pub mod include;
pub mod runtime;

pub use convert::{ConvertError, ConvertErrors};
pub use include::IncludeError;
pub use runtime::RuntimeError;

pub mod context;
pub mod critbit;
pub mod env;
pub mod error;
pub mod printer;
pub mod value;

pub use context::{DepthGuard, ErrorPolicy, EvalContext, DEFAULT_MAX_DEPTH};
pub use critbit::CritMap;
pub use env::Env;
pub use error::{MaltError, ReadError, Span};
pub use printer::{pr_str, Printer};
pub use lasso::Spur;
pub use value::{intern, resolve, with_resolved, Closure, Meta, NativeFn, Param, Value};

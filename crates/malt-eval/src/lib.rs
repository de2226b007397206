mod eval;
mod prelude;
pub mod quasiquote;
mod special_forms;

pub use eval::{apply, eval_string, eval_value, install, macroexpand, EvalResult, Trampoline};
pub use prelude::PRELUDE;
pub use special_forms::SPECIAL_FORM_NAMES;

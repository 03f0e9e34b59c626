pub mod process;
pub mod pytest;
pub mod linter;
pub mod formal;

pub use pytest::PytestCheck;
pub use linter::{ LinterCheck, PythonLinter };
pub use formal::FormalPlaceholder;

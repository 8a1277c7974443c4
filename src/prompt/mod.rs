pub mod input;
pub mod photography;
pub mod writer;

pub use input::InputPrompt;
pub use photography::build_photography_prompt;
pub use writer::build_writer_brief;

pub mod console;
pub mod writer_json;

pub use console::{produce_results, render_encoded, render_tamper_list, render_verdict};
pub use writer_json::{write_encoded, write_report};

//! CLI subcommand implementations for the memetrace binary.

pub mod collect_cmd;
pub mod doctor;
pub mod output;
pub mod preprocess_cmd;
pub mod report_cmd;
pub mod run_cmd;

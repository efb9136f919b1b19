pub mod app;
pub mod audio;
pub mod picker;
pub mod picker_ui;
pub mod ui;

use apem_player::config::Config;
use std::error::Error;
use std::path::PathBuf;

pub fn run(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn Error>> {
    app::run(files, config)
}

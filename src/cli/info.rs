use apem_player::time_format::format_ms;
use owo_colors::OwoColorize;
use std::error::Error;
use std::path::Path;

pub fn handle_info(file: &Path) -> Result<(), Box<dyn Error>> {
    if !file.is_file() {
        return Err(format!("{} does not exist", file.display()).into());
    }

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    match probe(file)? {
        Some(duration_ms) => println!("{}  {}", name.bold(), format_ms(duration_ms)),
        None => println!("{}  {}", name.bold(), "unknown duration".yellow()),
    }

    Ok(())
}

#[cfg(feature = "player")]
fn probe(file: &Path) -> Result<Option<u64>, Box<dyn Error>> {
    crate::player::audio::probe_duration_ms(file)
}

#[cfg(not(feature = "player"))]
fn probe(_file: &Path) -> Result<Option<u64>, Box<dyn Error>> {
    Err("Reading audio files requires the 'player' feature".into())
}

use apem_player::config::Config;
use std::error::Error;
use std::path::PathBuf;

pub fn handle_play(files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    #[cfg(feature = "player")]
    {
        crate::player::run(files, &config)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = (files, config);
        use owo_colors::OwoColorize;
        println!("{} {}", "🎵".cyan(), "apem player".bold());
        println!();
        println!(
            "{} The player requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, build with:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}

use anyhow::{anyhow, Result};
use bat::WrappingMode;

const THEME: &str = "GitHub";

pub fn print_markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to render output: {}", e))?;
    Ok(())
}

pub fn print_titled(content: &str, title: &str, language: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name(title))
        .theme(THEME)
        .language(language)
        .grid(true)
        .header(true)
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to render output: {}", e))?;
    Ok(())
}

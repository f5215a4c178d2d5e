// Writes leadboard.1 (and one page per subcommand) into the given directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::CommandFactory;
use leadboard::cli::Cli;

fn write_page(cmd: &clap::Command, name: &str, out_dir: &Path) -> Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buffer)
        .with_context(|| format!("Failed to render man page for {}", name))?;
    let path = out_dir.join(format!("{}.1", name));
    std::fs::write(&path, buffer).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let cmd = Cli::command();
    write_page(&cmd, "leadboard", &out_dir)?;
    for sub in cmd.get_subcommands() {
        let name = format!("leadboard-{}", sub.get_name());
        write_page(sub, &name, &out_dir)?;
    }
    Ok(())
}

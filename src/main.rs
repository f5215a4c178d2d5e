use leadboard::cli::run;

fn main() {
    let _ = enable_ansi_support::enable_ansi_support();
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LEADBOARD_LOG", "warn")).init();

    if let Err(e) = run() {
        // Check if this is an internal error (unreadable board file, I/O, etc.)
        let error_str: String = e.to_string();
        if error_str.contains("Failed to") || error_str.contains("Invalid config") {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

use anyhow::Result;
use std::env;
use watermark_rs::script::SessionScript;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <session.json>", args[0]);
        std::process::exit(1);
    }

    let script_path = &args[1];
    println!("Loading session script: {}", script_path);
    let script = SessionScript::from_file(script_path)?;

    match script.run()? {
        Some(path) => println!("Saved watermarked image to {}", path.display()),
        None => println!("Nothing to export: the watermark text is empty"),
    }

    Ok(())
}

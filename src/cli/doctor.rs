//! Environment readiness check.

use crate::browser::chromium::find_chromium;
use crate::config::{default_cookie_path, DataDirs};
use anyhow::Result;

/// Check Chromium availability, cookie export, and data directories.
pub fn run(cookie_path: Option<&std::path::Path>) -> Result<()> {
    println!("Memetrace Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set MEMETRACE_CHROMIUM_PATH."
        ),
    }

    let cookie_path = cookie_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_cookie_path);
    let cookies_ok = cookie_path.exists();
    if cookies_ok {
        println!("[OK] Cookie file present: {}", cookie_path.display());
    } else {
        println!(
            "[!!] Cookie file missing: {} (export your session cookies)",
            cookie_path.display()
        );
    }

    let dirs = DataDirs::resolve();
    match dirs.ensure() {
        Ok(()) => println!("[OK] Data directories writable under {}", dirs.raw.display()),
        Err(e) => println!("[!!] Cannot create data directories: {e}"),
    }

    println!();
    if chromium.is_some() && cookies_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

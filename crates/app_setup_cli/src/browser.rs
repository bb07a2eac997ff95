//! Best-effort launch of the default browser.
//!
//! Fails on headless hosts, which is expected; the URL is always printed as well.

use std::{io, process::Command};

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;

/// Opens `url` in the platform's default browser without waiting for it.
pub fn open(url: &str) -> io::Result<()> {
    #[cfg(all(unix, not(target_os = "macos")))]
    if std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none() {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no graphical session",
        ));
    }

    let mut command = build_open_command(url).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "browser launch is unsupported on this platform",
        )
    })?;
    command.spawn()?;
    Ok(())
}

/// The command that hands `url` to the platform's URL handler.
#[cfg(target_os = "windows")]
pub fn build_open_command(url: &str) -> Option<Command> {
    let mut cmd = Command::new("rundll32.exe");
    // `explorer <url>` can open File Explorer for some URL shapes.
    cmd.arg("url.dll,FileProtocolHandler").arg(url);
    Some(cmd)
}

/// The command that hands `url` to the platform's URL handler.
#[cfg(target_os = "macos")]
pub fn build_open_command(url: &str) -> Option<Command> {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    Some(cmd)
}

/// The command that hands `url` to the platform's URL handler.
#[cfg(all(unix, not(target_os = "macos")))]
pub fn build_open_command(url: &str) -> Option<Command> {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    Some(cmd)
}

#[cfg(not(any(windows, unix)))]
pub fn build_open_command(_url: &str) -> Option<Command> {
    None
}

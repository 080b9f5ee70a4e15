use std::{
    io,
    process::{Command, Stdio},
    thread,
};

use ratatui::{buffer::Buffer, layout::Rect, style::Color};

pub fn fill_bg(buf: &mut Buffer, area: Rect, color: Color) {
    let area = area.intersection(buf.area);
    for x in area.left()..area.right() {
        for y in area.top()..area.bottom() {
            buf[(x, y)].set_bg(color);
        }
    }
}

pub fn pad<S: AsRef<str>>(s: S, pad: usize) -> String {
    let s = s.as_ref();
    let mut out = String::with_capacity(s.len() + pad * 2);
    for _ in 0..pad {
        out.push(' ');
    }
    out.push_str(s);
    for _ in 0..pad {
        out.push(' ');
    }
    out
}

/// Hands `target` (a URL, `tel:` or `mailto:` link) to the desktop opener.
///
/// The opener gets no terminal streams so it cannot draw over the UI, and it
/// is reaped on a background thread.
pub fn open_url(target: &str) -> io::Result<()> {
    let mut command = opener_command(target);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    tracing::debug!(link = target, command = ?command, "opening link");
    let mut child = command.spawn()?;
    thread::Builder::new()
        .name("link-opener".to_string())
        .spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::warn!(%status, "link opener exited unsuccessfully");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "failed to wait for link opener"),
        })?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

// No shell in between: `cmd /C start` would interpret `&`, `|` and `^`.
#[cfg(target_os = "windows")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("rundll32");
    command.args(["url.dll,FileProtocolHandler", target]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}

pub fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())
}

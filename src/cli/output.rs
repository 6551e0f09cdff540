//! Console output helpers shared by the subcommands.

/// Whether non-essential output is suppressed (`--quiet`).
pub fn is_quiet() -> bool {
    std::env::var("MEMETRACE_QUIET").is_ok()
}

/// Styled status symbols, degrading to plain ASCII when color is off.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        let color = std::env::var("NO_COLOR").is_err()
            && std::env::var("MEMETRACE_NO_COLOR").is_err();
        Self { color }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m✓\x1b[0m"
        } else {
            "[ok]"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m!\x1b[0m"
        } else {
            "[!!]"
        }
    }

    pub fn err_sym(&self) -> &'static str {
        if self.color {
            "\x1b[31m✗\x1b[0m"
        } else {
            "[xx]"
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a stage banner, unless quiet.
pub fn stage_banner(title: &str) {
    if is_quiet() {
        return;
    }
    let line = "=".repeat(50);
    eprintln!("\n{line}\n {title}\n{line}");
}

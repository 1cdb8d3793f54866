/// Terminal display for a single contract
///
/// The session only talks to the [`Renderer`] trait. [`TerminalRenderer`]
/// clears the screen and prints a full frame on data changes, and rewrites
/// just the last line for the liveness spinner.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io::{self, Write};
use tracing::debug;

use crate::models::ContractState;
use crate::settings::{RULE_WIDTH, SPINNER_FRAMES};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";
const CURSOR_UP_CR: &str = "\x1B[A\r";

/// Display sink for the reader
pub trait Renderer {
    /// Draw the full frame
    fn render(&mut self, state: &ContractState, liveness: char, at: DateTime<Local>);
    /// Redraw only the liveness indicator
    fn tick(&mut self, liveness: char);
}

/// Counts receive-loop iterations; drives the spinner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivenessCounter(u64);

impl LivenessCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn advance(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    pub fn count(&self) -> u64 {
        self.0
    }

    pub fn symbol(&self) -> char {
        SPINNER_FRAMES[(self.0 % SPINNER_FRAMES.len() as u64) as usize]
    }
}

/// Cents to dollars, `N/A` when unknown
pub fn format_price(cents: Option<i64>) -> String {
    match cents {
        Some(c) => {
            let sign = if c < 0 { "-" } else { "" };
            let abs = c.unsigned_abs();
            format!("{sign}${}.{:02}", abs / 100, abs % 100)
        }
        None => "N/A".to_string(),
    }
}

/// 1234567 -> "1,234,567"
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn liveness_line(liveness: char) -> String {
    format!("  Press Ctrl+C to exit {liveness}")
}

/// Build the full frame text (no screen control codes)
pub fn format_frame(contract_id: &str, state: &ContractState, liveness: char, at: DateTime<Local>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::with_capacity(1024);

    // Writing into a String cannot fail
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "  CONTRACT: {contract_id}");
    let _ = writeln!(out, "{rule}");

    if state.is_empty() {
        let _ = writeln!(out, "\n  Waiting for data...\n");
    } else {
        let _ = writeln!(out, "\n  Title: {}", state.title.as_deref().unwrap_or("N/A"));
        if let Some(subtitle) = state.subtitle.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "  Subtitle: {subtitle}");
        }
        let _ = writeln!(out, "  Status: {}", state.status.as_deref().unwrap_or("N/A"));

        let _ = writeln!(out, "\n  --- Pricing ---");
        let _ = writeln!(out, "  Yes Bid:  {}", format_price(state.yes_bid));
        let _ = writeln!(out, "  Yes Ask:  {}", format_price(state.yes_ask));
        let _ = writeln!(out, "  No Bid:   {}", format_price(state.no_bid));
        let _ = writeln!(out, "  No Ask:   {}", format_price(state.no_ask));

        if state.last_price.is_some() {
            let _ = writeln!(out, "\n  Last Price: {}", format_price(state.last_price));
        }
        if let Some(volume) = state.volume {
            let _ = writeln!(out, "  Volume: {}", format_count(volume));
        }
        if let Some(oi) = state.open_interest {
            let _ = writeln!(out, "  Open Interest: {}", format_count(oi));
        }
    }

    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "  Last Update: {}", at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}", liveness_line(liveness));
    out
}

/// ANSI terminal renderer
pub struct TerminalRenderer<W: Write> {
    contract_id: String,
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(contract_id: impl Into<String>) -> Self {
        Self::new(contract_id, io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(contract_id: impl Into<String>, out: W) -> Self {
        Self {
            contract_id: contract_id.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_all(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!(error = %e, "Terminal write failed");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, state: &ContractState, liveness: char, at: DateTime<Local>) {
        let frame = format_frame(&self.contract_id, state, liveness, at);
        self.write_all(&format!("{CLEAR_SCREEN}{frame}"));
    }

    fn tick(&mut self, liveness: char) {
        // Cursor sits on the line below the spinner
        self.write_all(&format!("{CURSOR_UP_CR}{}\n", liveness_line(liveness)));
    }
}

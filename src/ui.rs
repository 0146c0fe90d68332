//! Terminal output.
//!
//! Progress and informational lines go to stdout and disappear under
//! `--silent`. Warnings and errors go to stderr and are always shown.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Ui {
    silent: bool,
}

impl Ui {
    pub fn new(silent: bool) -> Self {
        Self { silent }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn header(&self, title: &str) {
        if !self.silent {
            println!("\n{}", title);
        }
    }

    pub fn line(&self, message: impl AsRef<str>) {
        if !self.silent {
            println!("{}", message.as_ref());
        }
    }

    pub fn blank(&self) {
        if !self.silent {
            println!();
        }
    }

    pub fn success(&self, message: impl AsRef<str>) {
        if !self.silent {
            println!("✓ {}", message.as_ref());
        }
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        eprintln!("⚠ {}", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        eprintln!("✗ {}", message.as_ref());
    }

    pub fn spinner(&self, message: impl Into<String>) -> Spinner {
        let bar = if self.silent {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(message.into());
        Spinner { bar, silent: self.silent }
    }
}

pub struct Spinner {
    bar: ProgressBar,
    silent: bool,
}

impl Spinner {
    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish(self, message: impl AsRef<str>) {
        self.bar.finish_and_clear();
        if !self.silent {
            println!("✓ {}", message.as_ref());
        }
    }

    pub fn fail(self, message: impl AsRef<str>) {
        self.bar.finish_and_clear();
        eprintln!("✗ {}", message.as_ref());
    }

    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}

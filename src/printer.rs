use std::fmt::{self, Display, Write};

/// Default cap, in characters, on rendered values.
pub const DEFAULT_RENDER_CAP: usize = 5000;

/// Appended to a rendering that was cut at the cap.
pub const TRUNCATION_MARKER: &str = "\n[...output truncated...]";

/// Formats values for failure messages, cutting them at a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printer {
    cap: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_CAP)
    }
}

impl Printer {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the `Display` form of `value`, or its first `cap` characters
    /// followed by [`TRUNCATION_MARKER`] when it is longer.
    ///
    /// ```
    /// use tabletest::{Printer, TRUNCATION_MARKER};
    ///
    /// let printer = Printer::new(4);
    /// assert_eq!(printer.render(&"abcd"), "abcd");
    /// assert_eq!(printer.render(&"abcdef"), format!("abcd{TRUNCATION_MARKER}"));
    /// ```
    ///
    /// Formatting stops once the cap is passed, so rendering a huge or
    /// heavily shared value costs no more than its first `cap` characters.
    pub fn render(&self, value: &(impl Display + ?Sized)) -> String {
        let mut out = Bounded {
            buf: String::new(),
            room: self.cap,
            overflowed: false,
        };
        // An error here is either our own stop signal or a failing `Display`
        // impl; both leave a usable prefix in the buffer.
        let _ = write!(out, "{value}");
        let mut result = out.buf;
        if out.overflowed {
            result.push_str(TRUNCATION_MARKER);
        }
        result
    }
}

// Accepts at most `room` characters, then fails the write to stop the caller.
struct Bounded {
    buf: String,
    room: usize,
    overflowed: bool,
}

impl Write for Bounded {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (i, _) in s.char_indices() {
            if self.room == 0 {
                self.buf.push_str(&s[..i]);
                self.overflowed = true;
                return Err(fmt::Error);
            }
            self.room -= 1;
        }
        self.buf.push_str(s);
        Ok(())
    }
}

/// [`Printer::render`] with [`DEFAULT_RENDER_CAP`].
pub fn render(value: &(impl Display + ?Sized)) -> String {
    Printer::default().render(value)
}

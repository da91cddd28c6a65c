//! Dialer Buffer
//!
//! The number being composed for an outbound call. Input is filtered by a
//! character allow-list; there is no length limit and no normalization.

/// On-screen keypad, row by row
pub const KEYPAD: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

/// Whether `c` may appear in a dialed number
#[must_use]
pub fn is_dial_char(c: char) -> bool {
    matches!(c, '0'..='9' | '*' | '#' | '+' | '-' | '(' | ')' | ' ')
}

/// The number being composed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialerBuffer {
    text: String,
}

impl DialerBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether nothing has been typed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append one character; rejected characters leave the buffer unchanged
    pub fn push(&mut self, c: char) -> bool {
        if is_dial_char(c) {
            self.text.push(c);
            true
        } else {
            false
        }
    }

    /// Replace the whole contents, as when the input field is edited
    ///
    /// Accepted only if every character is allowed.
    pub fn replace(&mut self, value: &str) -> bool {
        if value.chars().all(is_dial_char) {
            self.text = value.to_string();
            true
        } else {
            false
        }
    }

    /// Remove the last character
    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    /// Empty the buffer
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Take the contents, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

//! The pocket calculator from the IOU screen: four operations, chained
//! left to right, with clear, sign flip and percent.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Key {
    Digit(u8),
    Decimal,
    Op(Operation),
    Equals,
    Clear,
    PlusMinus,
    Percent,
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Key::parse(&raw).ok_or_else(|| format!("unknown calculator key {raw:?}"))
    }
}

impl Key {
    pub fn parse(raw: &str) -> Option<Self> {
        let key = match raw.trim() {
            "." => Key::Decimal,
            "+" => Key::Op(Operation::Add),
            "-" | "−" => Key::Op(Operation::Subtract),
            "*" | "x" | "×" => Key::Op(Operation::Multiply),
            "/" | "÷" => Key::Op(Operation::Divide),
            "=" => Key::Equals,
            "C" | "c" => Key::Clear,
            "±" | "+/-" => Key::PlusMinus,
            "%" => Key::Percent,
            digit => {
                let mut chars = digit.chars();
                let value = chars.next()?.to_digit(10)?;
                if chars.next().is_some() {
                    return None;
                }
                Key::Digit(value as u8)
            }
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn perform(self, a: f64, b: f64) -> f64 {
        match self {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide if b != 0.0 => a / b,
            Operation::Divide => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculator {
    display: String,
    pending: Option<Operation>,
    previous: f64,
    reset_display: bool,
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            display: "0".into(),
            pending: None,
            previous: 0.0,
            reset_display: false,
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn press_all(&mut self, keys: impl IntoIterator<Item = Key>) -> &str {
        for key in keys {
            self.press(key);
        }
        self.display()
    }

    pub fn press(&mut self, key: Key) {
        match key {
            Key::Digit(digit) => self.digit(digit),
            Key::Decimal => self.decimal(),
            Key::Op(op) => self.operation(op),
            Key::Equals => self.equals(),
            Key::Clear => *self = Self::default(),
            Key::PlusMinus => {
                if let Some(value) = self.value() {
                    self.display = format_number(-value);
                }
            }
            Key::Percent => {
                if let Some(value) = self.value() {
                    self.display = format_number(value / 100.0);
                }
            }
        }
    }

    fn value(&self) -> Option<f64> {
        self.display.parse().ok()
    }

    fn digit(&mut self, digit: u8) {
        let digit = char::from(b'0' + digit.min(9));
        if self.reset_display || self.display == "0" {
            self.display = digit.to_string();
            self.reset_display = false;
        } else {
            self.display.push(digit);
        }
    }

    fn decimal(&mut self) {
        if self.reset_display {
            self.display = "0.".into();
            self.reset_display = false;
        } else if !self.display.contains('.') {
            self.display.push('.');
        }
    }

    fn operation(&mut self, op: Operation) {
        if let Some(value) = self.value() {
            match self.pending {
                Some(pending) => {
                    self.previous = pending.perform(self.previous, value);
                    self.display = format_number(self.previous);
                }
                None => self.previous = value,
            }
        }
        self.pending = Some(op);
        self.reset_display = true;
    }

    fn equals(&mut self) {
        let (Some(op), Some(value)) = (self.pending, self.value()) else {
            return;
        };
        self.previous = op.perform(self.previous, value);
        self.display = format_number(self.previous);
        self.pending = None;
        self.reset_display = true;
    }
}

/// Integers print without a decimal point, everything else with up to six
/// significant digits.
pub fn format_number(number: f64) -> String {
    if !number.is_finite() {
        return "Error".into();
    }
    if number == 0.0 {
        return "0".into();
    }
    if number.fract() == 0.0 {
        return format!("{number:.0}");
    }
    let magnitude = number.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 15) as usize;
    let formatted = format!("{number:.decimals$}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

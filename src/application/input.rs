//! Parsing of the free-text recipient and amount fields.

/// Splits on any run of commas and/or newlines, trims each token and drops
/// the empty ones. Order is preserved.
pub fn parse_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the longest leading `[+-]digits[.digits][e[+-]digits]` prefix,
/// ignoring whatever follows (`"5 tokens"` reads as 5).
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let start = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_from(start);
    let mut digit_count = end - start;
    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_from(end + 1);
        digit_count += fraction_end - (end + 1);
        if digit_count > 0 {
            end = fraction_end;
        }
    }
    if digit_count == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_start = end + 1 + sign;
        let exponent_end = digits_from(exponent_start);
        if exponent_end > exponent_start {
            end = exponent_end;
        }
    }
    s[..end].parse().ok()
}

/// Sums amount tokens as floats. Each token contributes its leading numeric
/// prefix; tokens without one, or that overflow to infinity, count as zero.
pub fn calculate_total(amounts: &[String]) -> f64 {
    amounts
        .iter()
        .filter_map(|amount| leading_float(amount.trim()))
        .filter(|value| value.is_finite())
        .sum()
}

/// The form fields exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchInput {
    pub recipients: String,
    pub amounts: String,
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub recipients: Vec<String>,
    pub amounts: Vec<String>,
}

/// Figures shown before the user sends the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub recipient_count: usize,
    pub total_amount: f64,
}

impl BatchInput {
    pub fn new(recipients: impl Into<String>, amounts: impl Into<String>) -> Self {
        Self {
            recipients: recipients.into(),
            amounts: amounts.into(),
            token_address: None,
        }
    }

    pub fn with_token(mut self, token_address: impl Into<String>) -> Self {
        self.token_address = Some(token_address.into());
        self
    }

    pub fn parse(&self) -> ParsedInput {
        ParsedInput {
            recipients: parse_list(&self.recipients),
            amounts: parse_list(&self.amounts),
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let parsed = self.parse();
        BatchSummary {
            recipient_count: parsed.recipients.len(),
            total_amount: calculate_total(&parsed.amounts),
        }
    }
}

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const DEFAULT_CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];
pub const DEFAULT_MIN_AMOUNT: f64 = 0.01;
pub const DEFAULT_MAX_AMOUNT: f64 = 1_000_000.00;

/// Currency symbols and acceptance bounds for parsed amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountRules {
    pub currency_symbols: Vec<char>,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl Default for AmountRules {
    fn default() -> Self {
        Self {
            currency_symbols: DEFAULT_CURRENCY_SYMBOLS.to_vec(),
            min_amount: DEFAULT_MIN_AMOUNT,
            max_amount: DEFAULT_MAX_AMOUNT,
        }
    }
}

/// Turns raw recognizer text into a validated monetary amount.
///
/// Recognizer output is noisy, so parsing starts by stripping every
/// character that cannot be part of an amount. Three patterns then run in
/// order, from strictest to loosest: symbol-prefixed grouped digits,
/// symbol-suffixed grouped digits, bare digits. The first pattern that
/// matches owns the text; its first match is the only candidate considered,
/// so an out-of-range reading rejects the whole text instead of degrading
/// into a partial match from a looser pattern.
pub struct AmountParser {
    rules: AmountRules,
    patterns: [Regex; 3],
}

impl AmountParser {
    pub fn new(rules: &AmountRules) -> Result<Self, PipelineError> {
        if rules.currency_symbols.is_empty() {
            return Err(PipelineError::configuration(
                "currency symbol set is empty",
            ));
        }
        if !rules.min_amount.is_finite() || !rules.max_amount.is_finite() {
            return Err(PipelineError::configuration(
                "amount bounds must be finite",
            ));
        }
        if rules.min_amount <= 0.0 || rules.min_amount > rules.max_amount {
            return Err(PipelineError::configuration(format!(
                "amount bounds {}..{} are not an increasing positive range",
                rules.min_amount, rules.max_amount
            )));
        }

        let symbols = symbol_class(&rules.currency_symbols);
        let grouped = r"\d{1,3}(?:,\d{3})*(?:\.\d{2})?";
        let patterns = [
            compile(&format!("{symbols}?({grouped})"))?,
            compile(&format!("({grouped}){symbols}?"))?,
            compile(&format!(r"{symbols}?(\d+(?:\.\d{{2}})?)"))?,
        ];

        Ok(Self {
            rules: rules.clone(),
            patterns,
        })
    }

    pub fn rules(&self) -> &AmountRules {
        &self.rules
    }

    /// Extracts an amount from one recognizer candidate, or `None` when the
    /// text holds no acceptable amount.
    pub fn parse(&self, text: &str) -> Option<f64> {
        let cleaned = self.strip_noise(text);
        if cleaned.is_empty() {
            return None;
        }

        for pattern in &self.patterns {
            let Some(captures) = pattern.captures(&cleaned) else {
                continue;
            };
            let candidate = captures.get(1)?.as_str().replace(',', "");
            let amount: f64 = candidate.parse().ok()?;
            if amount < self.rules.min_amount || amount > self.rules.max_amount {
                return None;
            }
            return Some(amount);
        }
        None
    }

    fn strip_noise(&self, text: &str) -> String {
        text.chars()
            .filter(|c| {
                c.is_ascii_digit()
                    || *c == '.'
                    || *c == ','
                    || self.rules.currency_symbols.contains(c)
            })
            .collect()
    }
}

fn symbol_class(symbols: &[char]) -> String {
    let mut class = String::from("[");
    for symbol in symbols {
        class.push_str(&regex::escape(&symbol.to_string()));
    }
    class.push(']');
    class
}

fn compile(pattern: &str) -> Result<Regex, PipelineError> {
    Regex::new(pattern).map_err(|err| {
        PipelineError::configuration(format!("amount pattern failed to compile: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> AmountParser {
        AmountParser::new(&AmountRules::default()).expect("default rules are valid")
    }

    #[test]
    fn parses_symbol_prefixed_grouped_amounts() {
        assert_eq!(parser().parse("$1,234.56 WIN"), Some(1234.56));
    }

    #[test]
    fn parses_bare_digits() {
        assert_eq!(parser().parse("250"), Some(250.0));
    }

    #[test]
    fn parses_symbol_suffixed_amounts() {
        assert_eq!(parser().parse("99.50€"), Some(99.5));
    }

    #[test]
    fn strips_recognizer_noise_before_matching() {
        assert_eq!(parser().parse("Prize: $150.75 !!"), Some(150.75));
    }

    #[test]
    fn rejects_text_without_digits() {
        assert_eq!(parser().parse("JACKPOT"), None);
        assert_eq!(parser().parse(""), None);
    }

    #[test]
    fn rejects_amounts_below_the_minimum() {
        assert_eq!(parser().parse("0.00"), None);
    }

    #[test]
    fn accepts_the_bounds_themselves() {
        assert_eq!(parser().parse("0.01"), Some(0.01));
        assert_eq!(parser().parse("$1,000,000.00"), Some(1_000_000.00));
    }

    #[test]
    fn rejects_amounts_above_the_maximum_without_degrading() {
        // the grouped pattern matched, so the oversized value must not fall
        // back to a partial bare-digit match
        assert_eq!(parser().parse("$2,000,000.00"), None);
        assert_eq!(parser().parse("$1,000,000.01"), None);
    }

    #[test]
    fn reparsing_a_rendered_amount_yields_the_same_amount() {
        let parser = parser();
        for text in ["250", "99.50€", "Prize: $817.20 !!"] {
            let amount = parser.parse(text).expect("parses");
            let rendered = format!("{amount:.2}");
            assert_eq!(parser.parse(&rendered), Some(amount), "{text}");
        }
        // at 1,000 and above the rendering must keep its grouping
        assert_eq!(parser.parse("1,234.56"), Some(1234.56));
    }

    #[test]
    fn custom_symbols_replace_the_defaults() {
        let rules = AmountRules {
            currency_symbols: vec!['¥'],
            ..AmountRules::default()
        };
        let parser = AmountParser::new(&rules).expect("valid rules");
        assert_eq!(parser.parse("¥1,500"), Some(1500.0));
        assert_eq!(parser.parse("$"), None);
    }

    #[test]
    fn rejects_empty_symbol_sets_and_inverted_bounds() {
        let empty = AmountRules {
            currency_symbols: Vec::new(),
            ..AmountRules::default()
        };
        assert!(AmountParser::new(&empty).is_err());

        let inverted = AmountRules {
            min_amount: 10.0,
            max_amount: 1.0,
            ..AmountRules::default()
        };
        assert!(AmountParser::new(&inverted).is_err());

        let zero_floor = AmountRules {
            min_amount: 0.0,
            ..AmountRules::default()
        };
        assert!(AmountParser::new(&zero_floor).is_err());
    }
}

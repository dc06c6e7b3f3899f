use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// Derive a decision from a raw model reply: first whitespace-delimited
    /// token, upper-cased. Anything outside {BUY, SELL, HOLD} is clamped to
    /// HOLD; the verbatim reply stays available on the snapshot for
    /// inspection.
    pub fn from_reply(raw: &str) -> Decision {
        let token = raw
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_uppercase();
        match token.as_str() {
            "BUY" => Decision::Buy,
            "SELL" => Decision::Sell,
            _ => Decision::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_token_case_insensitively() {
        assert_eq!(Decision::from_reply("buy now, the chart looks strong"), Decision::Buy);
        assert_eq!(Decision::from_reply("  SELL\neverything"), Decision::Sell);
        assert_eq!(Decision::from_reply("Hold"), Decision::Hold);
    }

    // The upstream contract does not promise a recognized token; clamping
    // unrecognized replies to HOLD is this crate's choice (the alternative
    // would be to carry the token through verbatim).
    #[test]
    fn unrecognized_token_clamps_to_hold() {
        assert_eq!(Decision::from_reply("Definitely buy!"), Decision::Hold);
        assert_eq!(Decision::from_reply(""), Decision::Hold);
        assert_eq!(Decision::from_reply("   "), Decision::Hold);
    }

    #[test]
    fn serializes_as_upper_case_word() {
        assert_eq!(serde_json::to_string(&Decision::Buy).unwrap(), "\"BUY\"");
        let d: Decision = serde_json::from_str("\"HOLD\"").unwrap();
        assert_eq!(d, Decision::Hold);
    }
}

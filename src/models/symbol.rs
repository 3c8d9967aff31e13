use std::fmt;

/// Quote assets recognised when a pair is written without a separator.
/// Longer codes first so `BTCUSDT` splits as BTC/USDT rather than BTCUS/DT.
const KNOWN_QUOTES: &[&str] = &["FDUSD", "USDT", "USDC", "BUSD", "USD", "EUR", "BTC", "ETH"];

/// A base/quote trading pair, parsed from whatever spelling the signal feed used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    pub fn parse(raw: &str) -> Option<Symbol> {
        let s = raw.trim().to_ascii_uppercase();
        if s.is_empty() {
            return None;
        }

        if let Some((base, quote)) = s.split_once(['/', '-', '_']) {
            if base.is_empty() || quote.is_empty() {
                return None;
            }
            return Some(Symbol {
                base: base.to_string(),
                quote: quote.to_string(),
            });
        }

        KNOWN_QUOTES.iter().find_map(|quote| {
            s.strip_suffix(quote)
                .filter(|base| !base.is_empty())
                .map(|base| Symbol {
                    base: base.to_string(),
                    quote: quote.to_string(),
                })
        })
    }

    /// `BTC-USDT`
    pub fn coinbase_product(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// `BTCUSDT`
    pub fn binance_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Engineered features per bar:
/// 0 EMA spread / ATR, 1 RSI / 100, 2 engulfing (+1/-1/0),
/// 3 ATR / close, 4 one-bar return / ATR, 5 higher-timeframe bias (+1/-1/0).
pub const N_FEATURES: usize = 6;

/// Feature rows with binary "next move up" labels.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<[f64; N_FEATURES]>,
    pub labels: Vec<bool>,
}

impl Dataset {
    pub fn push(&mut self, row: [f64; N_FEATURES], label: bool) {
        self.features.push(row);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn has_both_classes(&self) -> bool {
        self.labels.iter().any(|&l| l) && self.labels.iter().any(|&l| !l)
    }
}

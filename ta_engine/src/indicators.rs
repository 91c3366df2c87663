/// indicators.rs — Rolling technical indicators over close prices
///
/// Every function returns a vector aligned with its input; bars without a
/// full look-back window hold `f64::NAN`.
///
///   SMA_t    = mean(x_{t−p+1..t})
///   EMA_t    = α·x_t + (1−α)·EMA_{t−1},  α = 2/(p+1), seeded with SMA_p
///   σ_t      = population std of the window
///   Z_t      = (x_t − SMA_t) / σ_t
///   RSI_t    = 100 − 100/(1 + RS),  RS = Wilder avg gain / avg loss
///   MACD     = EMA_fast − EMA_slow;  signal = EMA(MACD);  hist = MACD − signal
///   Donchian = max / min of the window, mid = (max+min)/2
///   CRSI     = (RSI(close, 3) + RSI(streak, 2) + PercentRank(ROC₁, 100)) / 3

/// Simple moving average.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || period > n {
        return out;
    }
    for i in period - 1..n {
        out[i] = data[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
    }
    out
}

/// Exponential moving average, seeded with the SMA of the first `period`
/// valid values.  Leading NaNs in the input are skipped.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    let Some(start) = data.iter().position(|x| !x.is_nan()) else {
        return out;
    };
    if period == 0 || start + period > n {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed_end = start + period - 1;
    let mut prev = data[start..=seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end] = prev;
    for i in seed_end + 1..n {
        prev = alpha * data[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}

/// Rolling population standard deviation.
pub fn rolling_std(data: &[f64], period: usize) -> Vec<f64> {
    let means = sma(data, period);
    let mut out = vec![f64::NAN; data.len()];
    for (i, &m) in means.iter().enumerate() {
        if m.is_nan() {
            continue;
        }
        let window = &data[i + 1 - period..=i];
        let var = window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / period as f64;
        out[i] = var.sqrt();
    }
    out
}

/// Rolling z-score of each value against its own window.
/// A flat window (σ = 0) scores 0.
pub fn zscore(data: &[f64], period: usize) -> Vec<f64> {
    let means = sma(data, period);
    let stds = rolling_std(data, period);
    data.iter()
        .zip(means.iter().zip(&stds))
        .map(|(&x, (&m, &s))| {
            if m.is_nan() || s.is_nan() {
                f64::NAN
            } else if s < 1e-12 {
                0.0
            } else {
                (x - m) / s
            }
        })
        .collect()
}

/// Bollinger Bands output.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper:  Vec<f64>,
    pub middle: Vec<f64>,
    pub lower:  Vec<f64>,
}

impl BollingerBands {
    /// %B: position of `price` inside the band at bar `i` (0 = lower, 1 = upper).
    /// A collapsed band yields 0.5.
    pub fn percent_b(&self, i: usize, price: f64) -> f64 {
        let (u, l) = (self.upper[i], self.lower[i]);
        if u.is_nan() || l.is_nan() {
            return f64::NAN;
        }
        let width = u - l;
        if width < 1e-12 {
            0.5
        } else {
            (price - l) / width
        }
    }
}

pub fn bollinger(data: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let middle = sma(data, period);
    let stds = rolling_std(data, period);
    let upper = middle.iter().zip(&stds).map(|(m, s)| m + num_std * s).collect();
    let lower = middle.iter().zip(&stds).map(|(m, s)| m - num_std * s).collect();
    BollingerBands { upper, middle, lower }
}

/// Relative Strength Index with Wilder smoothing, in [0, 100].
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n <= period {
        return out;
    }

    let p = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= p;
    avg_loss /= p;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in period + 1..n {
        let change = data[i] - data[i - 1];
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss < 1e-12 {
        if avg_gain < 1e-12 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD output.
#[derive(Debug, Clone)]
pub struct Macd {
    pub macd_line:   Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram:   Vec<f64>,
}

pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(data, fast);
    let slow_ema = ema(data, slow);
    let macd_line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, signal);
    let histogram = macd_line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();
    Macd { macd_line, signal_line, histogram }
}

/// Donchian channel over closes.
#[derive(Debug, Clone)]
pub struct Donchian {
    pub upper:  Vec<f64>,
    pub lower:  Vec<f64>,
    pub middle: Vec<f64>,
}

pub fn donchian(data: &[f64], period: usize) -> Donchian {
    let n = data.len();
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];
    let mut middle = vec![f64::NAN; n];
    if period == 0 || period > n {
        return Donchian { upper, lower, middle };
    }
    for i in period - 1..n {
        let window = &data[i + 1 - period..=i];
        let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
        upper[i] = hi;
        lower[i] = lo;
        middle[i] = (hi + lo) / 2.0;
    }
    Donchian { upper, lower, middle }
}

/// One-period rate of change, r_t = x_t/x_{t−1} − 1.
pub fn roc(data: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    for i in 1..data.len() {
        out[i] = data[i] / data[i - 1] - 1.0;
    }
    out
}

/// Signed run length of consecutive up (+) or down (−) closes; 0 when unchanged.
pub fn streak(data: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; data.len()];
    for i in 1..data.len() {
        let prev = out[i - 1];
        out[i] = if data[i] > data[i - 1] {
            if prev > 0.0 { prev + 1.0 } else { 1.0 }
        } else if data[i] < data[i - 1] {
            if prev < 0.0 { prev - 1.0 } else { -1.0 }
        } else {
            0.0
        };
    }
    out
}

/// Percentage (0–100) of the previous `period` values strictly below the
/// current one.  NaN while any value in the look-back is NaN.
pub fn percent_rank(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 {
        return out;
    }
    for i in period..n {
        let window = &data[i - period..i];
        if data[i].is_nan() || window.iter().any(|x| x.is_nan()) {
            continue;
        }
        let below = window.iter().filter(|&&x| x < data[i]).count();
        out[i] = below as f64 / period as f64 * 100.0;
    }
    out
}

/// Connors RSI.
pub fn connors_rsi(data: &[f64], rsi_period: usize, streak_period: usize, rank_period: usize) -> Vec<f64> {
    let price_rsi = rsi(data, rsi_period);
    let streak_rsi = rsi(&streak(data), streak_period);
    let rank = percent_rank(&roc(data), rank_period);
    price_rsi
        .iter()
        .zip(streak_rsi.iter().zip(&rank))
        .map(|(a, (b, c))| (a + b + c) / 3.0)
        .collect()
}

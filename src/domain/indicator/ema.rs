//! Exponential moving average.
//!
//! k = 2/(n+1), seeded with the first defined input, then
//! EMA[i] = EMA[i-1] + k*(x[i] - EMA[i-1]). No output until n defined inputs
//! have been seen. Undefined inputs produce no output and leave the state as is.

pub fn calculate_ema(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;
    let mut seen = 0usize;

    values
        .iter()
        .map(|value| {
            let x = (*value).filter(|v| v.is_finite())?;
            seen += 1;
            let next = match ema {
                Some(prev) => prev + k * (x - prev),
                None => x,
            };
            ema = Some(next);
            (seen >= period).then_some(next)
        })
        .collect()
}

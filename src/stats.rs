#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Stats {
    pub fn compute(data: &[i64]) -> Option<Stats> {
        let min = *data.iter().min()?;
        let max = *data.iter().max()?;
        let sum: i128 = data.iter().map(|&value| i128::from(value)).sum();
        let mean = sum as f64 / data.len() as f64;

        let variance = data
            .iter()
            .map(|value| (mean - (*value as f64)).powf(2.))
            .sum::<f64>()
            / (data.len() as f64);

        Some(Stats {
            count: data.len(),
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

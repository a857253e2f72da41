/// Home value after `months_elapsed` months of annual compounding appreciation.
pub fn home_value(initial: f64, appreciation_pct: f64, months_elapsed: u32) -> f64 {
    if appreciation_pct == 0.0 {
        return initial;
    }
    initial * (1.0 + appreciation_pct / 100.0).powf(months_elapsed as f64 / 12.0)
}

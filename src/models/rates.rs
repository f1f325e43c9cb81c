/// Billing rate precedence: entry-level override (present and positive),
/// then the owning department's rate, then the client default. Used both
/// when rendering the weekly grid and when pricing unbilled hours.
pub fn resolve_rate(
    entry_rate: Option<f64>,
    department_rate: Option<f64>,
    client_default: f64,
) -> f64 {
    if let Some(rate) = entry_rate {
        if rate > 0.0 {
            return rate;
        }
    }
    if let Some(rate) = department_rate {
        if rate > 0.0 {
            return rate;
        }
    }
    client_default
}

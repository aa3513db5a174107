/// Display interval label for a requested day count.
///
/// Informational only: the label names the nominal bucket size used in the
/// output filename and final message. It is never sent to the API, which
/// picks its own granularity based on the day count.
pub fn interval_label(days: u32) -> &'static str {
    match days {
        1 => "5m",
        2..=7 => "30m",
        8..=14 => "1h",
        15..=30 => "4h",
        _ => "1d",
    }
}

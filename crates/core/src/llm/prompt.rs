/// Builds the decision prompt. Byte-for-byte deterministic for identical
/// inputs: dashboards and logs show the exact text sent to the model, and the
/// tests pin the format.
///
/// The hyphen in "7‑day" is U+2011 (non-breaking).
pub fn compose(
    headlines: &[String],
    price: f64,
    forecast_price: Option<f64>,
    recent_prices: &[f64],
    symbol: &str,
    quote: &str,
) -> String {
    let forecast_text = match forecast_price {
        Some(p) => format!("{p:.6}"),
        None => "N/A".to_string(),
    };
    let recent_line = recent_prices
        .iter()
        .map(|p| format!("{p:.6}"))
        .collect::<Vec<_>>()
        .join(", ");
    let bullets = headlines
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "News Headlines:\n{bullets}\n\n\
         Current Price {symbol}/{quote}: {price}\n\
         7\u{2011}day Forecast: {forecast_text}\n\
         Recent Hourly Prices: {recent_line}\n\n\
         Respond with BUY, SELL, or HOLD (one word)."
    )
}

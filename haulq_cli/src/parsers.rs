use jiff::{SignedDuration, SpanRelativeTo};

pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    if let Ok(duration) = input.parse::<SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Parses `CONTRACTOR=OFFSET`, e.g. `B=+30m`, `A=-PT15M` or `C=-900` (seconds).
pub fn parse_offset(input: &str) -> Result<(String, SignedDuration), String> {
    let (contractor, offset) = input
        .split_once('=')
        .ok_or_else(|| format!("expected CONTRACTOR=OFFSET, got {input}"))?;

    let contractor = contractor.trim();
    if contractor.is_empty() {
        return Err(String::from("missing contractor id"));
    }

    let offset = offset.trim();
    let (negative, magnitude) = match offset.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, offset.strip_prefix('+').unwrap_or(offset)),
    };
    let magnitude = parse_duration(magnitude)?;

    Ok((
        contractor.to_owned(),
        if negative { -magnitude } else { magnitude },
    ))
}

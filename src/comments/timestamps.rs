//! Timestamp mentions inside comment text, e.g. "3:15" or "1:02:45".

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d:])(?:(\d{1,2}):)?(\d{1,2}):([0-5]\d)(?:$|[^\d:])").expect("Invalid regex")
});

/// Seconds for every timestamp mentioned in `text`, in order of appearance.
///
/// With an hour part the minutes must be below 60.
pub fn extract_mentions(text: &str) -> Vec<f64> {
    let mut mentions = Vec::new();
    let mut offset = 0;
    // Matches consume one delimiter on each side; restart just before the
    // trailing delimiter so adjacent mentions like "1:00 2:00" both match.
    while let Some(caps) = MENTION.captures_at(text, offset) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        let seconds_end = caps.get(3).map(|m| m.end()).unwrap_or(whole.end);

        let minutes: u64 = caps[2].parse().unwrap_or(0);
        let seconds: u64 = caps[3].parse().unwrap_or(0);
        match caps.get(1).and_then(|h| h.as_str().parse::<u64>().ok()) {
            Some(hours) if minutes < 60 => mentions.push((hours * 3600 + minutes * 60 + seconds) as f64),
            Some(_) => {}
            None => mentions.push((minutes * 60 + seconds) as f64),
        }

        offset = seconds_end;
        if offset >= text.len() {
            break;
        }
    }
    mentions
}

/// The timestamp mentioned most often; ties go to the earliest mention.
pub fn most_frequent_mention<'a, I>(texts: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut order: Vec<u64> = Vec::new();
    for text in texts {
        for secs in extract_mentions(text) {
            let key = secs as u64;
            let count = counts.entry(key).or_insert(0);
            if *count == 0 {
                order.push(key);
            }
            *count += 1;
        }
    }

    let mut best: Option<(u64, usize)> = None;
    for key in order {
        let count = counts[&key];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(secs, _)| secs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mentions() {
        assert_eq!(extract_mentions("the drop at 3:15 is insane"), vec![195.0]);
        assert_eq!(extract_mentions("1:02:45 lol"), vec![3765.0]);
        assert_eq!(extract_mentions("0:30 and 12:05"), vec![30.0, 725.0]);
        assert_eq!(extract_mentions("1:00 2:00"), vec![60.0, 120.0]);
    }

    #[test]
    fn test_ignores_non_timestamps() {
        assert!(extract_mentions("no times here").is_empty());
        assert!(extract_mentions("ratio 3:99").is_empty());
        assert!(extract_mentions("version 1.2.3").is_empty());
        assert!(extract_mentions("1:75:00").is_empty());
    }

    #[test]
    fn test_most_frequent_mention() {
        let texts = ["4:00 was good", "2:10!", "yes 2:10", "4:00"];
        // Tie between 4:00 and 2:10; 4:00 appeared first.
        assert_eq!(most_frequent_mention(texts.iter().copied()), Some(240.0));

        let texts = ["4:00", "2:10", "2:10"];
        assert_eq!(most_frequent_mention(texts.iter().copied()), Some(130.0));
        assert_eq!(most_frequent_mention(["nothing"].iter().copied()), None);
    }
}

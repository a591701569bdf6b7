// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Identifier Predictability Analysis
 * Flags session tokens and IDs an attacker could guess
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

/// Minimum acceptable identifier length. Anything shorter has too little
/// keyspace regardless of how random it looks.
pub const MIN_TOKEN_LENGTH: usize = 32;

/// Consecutive numeric samples closer than this are treated as sequential.
pub const SEQUENTIAL_DELTA: u64 = 1000;

/// Why a sample set was judged predictable.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictabilityVerdict {
    /// Consecutive numeric interpretations differ by less than the delta.
    Sequential { max_delta: u64 },
    /// At least one sample is under the minimum length floor.
    TooShort { shortest: usize },
}

/// Judge a set of identifiers issued in quick succession. `None` means no
/// predictability evidence; it is NOT a proof of randomness.
pub fn analyze(samples: &[String]) -> Option<PredictabilityVerdict> {
    if samples.is_empty() {
        return None;
    }

    let shortest = samples.iter().map(|s| s.len()).min().unwrap_or(0);
    if shortest < MIN_TOKEN_LENGTH {
        return Some(PredictabilityVerdict::TooShort { shortest });
    }

    // Numeric interpretation: only meaningful when every sample parses.
    let numeric: Vec<u64> = samples
        .iter()
        .filter_map(|s| s.parse::<u64>().ok())
        .collect();
    if numeric.len() == samples.len() && numeric.len() >= 2 {
        let max_delta = numeric
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .max()
            .unwrap_or(0);
        if max_delta < SEQUENTIAL_DELTA {
            return Some(PredictabilityVerdict::Sequential { max_delta });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_tokens_flagged() {
        let samples = vec!["abc123".to_string(), "def456".to_string()];
        assert_eq!(
            analyze(&samples),
            Some(PredictabilityVerdict::TooShort { shortest: 6 })
        );
    }

    #[test]
    fn test_sequential_numeric_ids_flagged() {
        // 40-digit zero-padded counters: long enough, still guessable.
        let samples: Vec<String> = (1000u64..1004).map(|n| format!("{:040}", n)).collect();
        match analyze(&samples) {
            Some(PredictabilityVerdict::Sequential { max_delta }) => {
                assert!(max_delta < SEQUENTIAL_DELTA)
            }
            other => panic!("expected sequential verdict, got {:?}", other),
        }
    }

    #[test]
    fn test_long_random_tokens_clean() {
        let samples = vec![
            "f3a9c1e7b2d84f60a5c3917e4d2b8a06f1e9c7d3b5a28406e7f1c9d3a5b7e902".to_string(),
            "09b8a7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8".to_string(),
            "7d2e9f4a1b8c5d0e3f6a9b2c5d8e1f4a7b0c3d6e9f2a5b8c1d4e7f0a3b6c9d2".to_string(),
        ];
        assert_eq!(analyze(&samples), None);
    }

    #[test]
    fn test_widely_spaced_numerics_clean() {
        let samples = vec![
            format!("{:040}", 184_467_440_737u64),
            format!("{:040}", 982_002_117_345u64),
            format!("{:040}", 445_118_930_206u64),
        ];
        assert_eq!(analyze(&samples), None);
    }

    #[test]
    fn test_empty_input_clean() {
        assert_eq!(analyze(&[]), None);
    }
}

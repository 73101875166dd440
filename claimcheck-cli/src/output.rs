//! Terminal presentation of verification results.

use claimcheck_core::{Verdict, VerificationResult};

use crate::markdown;
use crate::markdown::ansi;

/// Print a verification result: verdict banner, confidence, analysis body,
/// and the numbered source list.
pub fn print_result(claim: &str, result: &VerificationResult, color: bool) {
    if color {
        println!("{}Claim:{} {}", ansi::BOLD_ON, ansi::BOLD_OFF, claim);
        println!(
            "{}Verdict:{} {}{}{}",
            ansi::BOLD_ON,
            ansi::BOLD_OFF,
            verdict_color(result.verdict),
            result.verdict,
            ansi::RESET
        );
        println!(
            "{}Confidence:{} {}%",
            ansi::BOLD_ON,
            ansi::BOLD_OFF,
            result.truth_percentage
        );
        println!();
        print!("{}", markdown::render_markdown(&result.analysis));
    } else {
        println!("Claim: {claim}");
        println!("Verdict: {}", result.verdict);
        println!("Confidence: {}%", result.truth_percentage);
        println!();
        println!("{}", result.analysis);
    }

    if !result.sources.is_empty() {
        println!();
        if color {
            println!("{}Sources:{}", ansi::BOLD_ON, ansi::BOLD_OFF);
        } else {
            println!("Sources:");
        }
        for (index, source) in result.sources.iter().enumerate() {
            if color {
                println!(
                    "  {}. {} {}<{}>{}",
                    index + 1,
                    source.title,
                    ansi::DIM_ON,
                    source.uri,
                    ansi::DIM_OFF
                );
            } else {
                println!("  {}. {} <{}>", index + 1, source.title, source.uri);
            }
        }
    }
}

/// ANSI color for a verdict banner.
fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::True => ansi::GREEN,
        Verdict::False => ansi::RED,
        Verdict::Mixed => ansi::YELLOW,
        Verdict::Unverifiable => ansi::DIM_ON,
    }
}
